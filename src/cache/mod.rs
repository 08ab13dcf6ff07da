// Cache module.
// In-memory LRU per agent plus an on-disk page cache shared across runs.

pub mod lru;
pub mod paths;
pub mod store;

pub use lru::PageCache;
pub use store::{DEFAULT_TTL, DiskCache};
