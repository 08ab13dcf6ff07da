// Contacts module.
// Contact records, list merge rules, and CSV import/export.

pub mod file;
pub mod merge;
pub mod model;

pub use merge::{deduplicate, fill_unknown, merge, merge_original_and_updated, with_subpages};
pub use model::{Contact, ContactRow, UNKNOWN};
