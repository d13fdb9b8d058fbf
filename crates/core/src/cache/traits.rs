//! Trait definitions for the content cache.

use std::path::Path;

use async_trait::async_trait;

use super::error::CacheError;
use super::types::CacheEntry;

/// Stores converted artifacts under a caller-supplied key.
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// Returns the name of this cache implementation.
    fn name(&self) -> &str;

    /// Finds a usable entry for `(cache_key, format)`.
    ///
    /// A miss is never an error: empty or unsafe keys, missing, unreadable
    /// and zero-length files all yield `None`.
    async fn lookup(&self, cache_key: &str, format: &str) -> Option<CacheEntry>;

    /// Copies `artifact` into the cache, replacing any existing entry.
    async fn store(
        &self,
        cache_key: &str,
        format: &str,
        artifact: &Path,
    ) -> Result<CacheEntry, CacheError>;

    /// Copies a cached entry to `target`. Returns the number of bytes copied.
    async fn copy_to(&self, entry: &CacheEntry, target: &Path) -> Result<u64, CacheError>;
}
