//! Error types for the content cache.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while storing or copying cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Key is empty or would escape the cache root.
    #[error("Invalid cache key: {key:?}")]
    InvalidKey { key: String },

    #[error("Invalid cache format: {format:?}")]
    InvalidFormat { format: String },

    /// Filesystem operation on a cache path failed.
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
