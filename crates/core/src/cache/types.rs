//! Types for the content cache.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A stored artifact, addressed by `(cache_key, format)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub format: String,
    /// Backing file, `<root>/<format>/<cache_key>`.
    pub path: PathBuf,
    pub size_bytes: u64,
}
