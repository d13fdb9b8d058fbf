//! Content cache for converted artifacts.
//!
//! Callers supply the cache key; the cache only guarantees that an entry it
//! returns is a non-empty, readable regular file.

mod error;
mod fs_cache;
mod traits;
mod types;

pub use error::CacheError;
pub use fs_cache::FsContentCache;
pub use traits::ContentCache;
pub use types::CacheEntry;
