//! Filesystem-backed content cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::metrics;
use crate::paths::{atomic, normalize_format};

use super::error::CacheError;
use super::traits::ContentCache;
use super::types::CacheEntry;

/// Content cache laid out as `<root>/<format>/<cache_key>`.
///
/// Entries are append-only: lookups never modify them and nothing expires.
#[derive(Debug, Clone)]
pub struct FsContentCache {
    root: PathBuf,
}

impl FsContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file for `(cache_key, format)`, or `None` if either part is unsafe.
    pub fn entry_path(&self, cache_key: &str, format: &str) -> Option<PathBuf> {
        let format = normalize_format(format);
        if !is_safe_segment(cache_key) || !is_safe_segment(&format) {
            return None;
        }
        Some(self.root.join(format).join(cache_key))
    }
}

/// A single path component that cannot climb out of its parent.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.contains("..")
        && !segment.contains(['/', '\\', '\0'])
        && segment != "."
}

#[async_trait]
impl ContentCache for FsContentCache {
    fn name(&self) -> &str {
        "fs"
    }

    async fn lookup(&self, cache_key: &str, format: &str) -> Option<CacheEntry> {
        let Some(path) = self.entry_path(cache_key, format) else {
            debug!(cache_key, format, "Cache key rejected, treating as miss");
            metrics::CACHE_LOOKUPS
                .with_label_values(&["invalid_key"])
                .inc();
            return None;
        };

        let usable = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                // Must also open for reading.
                fs::File::open(&path).await.ok().map(|_| meta.len())
            }
            _ => None,
        };

        match usable {
            Some(size_bytes) => {
                debug!(path = %path.display(), size_bytes, "Cache hit");
                metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                Some(CacheEntry {
                    cache_key: cache_key.to_string(),
                    format: normalize_format(format),
                    path,
                    size_bytes,
                })
            }
            None => {
                debug!(path = %path.display(), "Cache miss");
                metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                None
            }
        }
    }

    async fn store(
        &self,
        cache_key: &str,
        format: &str,
        artifact: &Path,
    ) -> Result<CacheEntry, CacheError> {
        let normalized = normalize_format(format);
        if !is_safe_segment(&normalized) {
            return Err(CacheError::InvalidFormat {
                format: format.to_string(),
            });
        }
        if !is_safe_segment(cache_key) {
            return Err(CacheError::InvalidKey {
                key: cache_key.to_string(),
            });
        }

        let dir = self.root.join(&normalized);
        let path = dir.join(cache_key);

        let result = async {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| CacheError::io(&dir, e))?;
            atomic::copy_atomically(artifact, &path)
                .await
                .map_err(|e| CacheError::io(&path, e))
        }
        .await;

        match result {
            Ok(size_bytes) => {
                metrics::CACHE_STORES.with_label_values(&["success"]).inc();
                debug!(path = %path.display(), size_bytes, "Stored cache entry");
                Ok(CacheEntry {
                    cache_key: cache_key.to_string(),
                    format: normalized,
                    path,
                    size_bytes,
                })
            }
            Err(e) => {
                metrics::CACHE_STORES.with_label_values(&["error"]).inc();
                warn!(error = %e, "Failed to store cache entry");
                Err(e)
            }
        }
    }

    async fn copy_to(&self, entry: &CacheEntry, target: &Path) -> Result<u64, CacheError> {
        atomic::copy_atomically(&entry.path, target)
            .await
            .map_err(|e| CacheError::io(target, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> FsContentCache {
        FsContentCache::new(dir.path().join("cache"))
    }

    #[test]
    fn test_entry_path_layout() {
        let cache = FsContentCache::new("/var/cache/convertino");
        assert_eq!(
            cache.entry_path("abc123", "PDF"),
            Some(PathBuf::from("/var/cache/convertino/pdf/abc123"))
        );
        assert_eq!(cache.entry_path("", "pdf"), None);
        assert_eq!(cache.entry_path("../etc/passwd", "pdf"), None);
        assert_eq!(cache.entry_path("a/b", "pdf"), None);
        assert_eq!(cache.entry_path("a\\b", "pdf"), None);
        assert_eq!(cache.entry_path("key", ".."), None);
    }

    #[tokio::test]
    async fn test_store_then_lookup_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let artifact = dir.path().join("report.pdf");
        fs::write(&artifact, b"%PDF-1.4 body").await.unwrap();

        let stored = cache.store("abc123", "pdf", &artifact).await.unwrap();
        assert_eq!(stored.path, dir.path().join("cache/pdf/abc123"));
        assert_eq!(stored.size_bytes, 13);
        // Copied, not moved
        assert!(artifact.exists());

        let found = cache.lookup("abc123", "pdf").await.unwrap();
        assert_eq!(found, stored);
        assert_eq!(fs::read(&found.path).await.unwrap(), b"%PDF-1.4 body");

        assert!(cache.lookup("other", "pdf").await.is_none());
        assert!(cache.lookup("abc123", "png").await.is_none());
    }

    #[tokio::test]
    async fn test_store_overwrites_existing_entry() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::write(&first, b"one").await.unwrap();
        fs::write(&second, b"second version").await.unwrap();

        cache.store("key", "txt", &first).await.unwrap();
        let entry = cache.store("key", "txt", &second).await.unwrap();

        assert_eq!(entry.size_bytes, 14);
        assert_eq!(fs::read(&entry.path).await.unwrap(), b"second version");
    }

    #[tokio::test]
    async fn test_zero_length_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let path = dir.path().join("cache/pdf/empty");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"").await.unwrap();

        assert!(cache.lookup("empty", "pdf").await.is_none());
    }

    #[tokio::test]
    async fn test_directory_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        fs::create_dir_all(dir.path().join("cache/pdf/dir-key"))
            .await
            .unwrap();

        assert!(cache.lookup("dir-key", "pdf").await.is_none());
    }

    #[tokio::test]
    async fn test_store_rejects_unsafe_key() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let artifact = dir.path().join("a.pdf");
        fs::write(&artifact, b"x").await.unwrap();

        let err = cache.store("../escape", "pdf", &artifact).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
        assert!(!dir.path().join("escape").exists());
    }

    #[tokio::test]
    async fn test_copy_to_target() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let artifact = dir.path().join("a.pdf");
        fs::write(&artifact, b"0123456789").await.unwrap();
        let entry = cache.store("abc123", "pdf", &artifact).await.unwrap();

        let target = dir.path().join("out.pdf");
        let bytes = cache.copy_to(&entry, &target).await.unwrap();

        assert_eq!(bytes, 10);
        assert_eq!(fs::read(&target).await.unwrap(), b"0123456789");
    }
}
