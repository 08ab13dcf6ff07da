// Web module.
// Page fetching over HTTP and HTML cleanup before pages reach the model.

pub mod clean;
pub mod fetch;

pub use clean::clean_html;
pub use fetch::{PageFetcher, PageSource};
