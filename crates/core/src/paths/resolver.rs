//! Deterministic target path resolution.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::conversion::ConvertError;

/// Lower-cases `format` and strips surrounding whitespace and leading dots.
pub fn normalize_format(format: &str) -> String {
    format.trim().trim_start_matches('.').trim().to_lowercase()
}

/// `<source_dir>/<source_stem>.<format>`.
pub fn default_target(source: &Path, format: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    directory_of(source).join(format!("{}.{}", stem, format))
}

/// Parent directory, treating a bare file name as living in `.`.
fn directory_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Computes target paths and makes sure their directory is usable.
#[derive(Debug, Clone, Default)]
pub struct PathResolver;

impl PathResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves the output path for a conversion.
    ///
    /// An explicit path wins over the default. The containing directory is
    /// created when missing and must accept new files.
    pub async fn resolve(
        &self,
        explicit: Option<&Path>,
        source: &Path,
        format: &str,
    ) -> Result<PathBuf, ConvertError> {
        let target = match explicit {
            Some(path) => path.to_path_buf(),
            None => default_target(source, format),
        };
        let dir = directory_of(&target);

        self.ensure_directory(&dir).await?;
        self.probe_writable(&dir).await?;

        debug!(target = %target.display(), "Resolved target path");
        Ok(target)
    }

    async fn ensure_directory(&self, dir: &Path) -> Result<(), ConvertError> {
        match fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(ConvertError::invalid_target_directory(
                    dir,
                    "path exists but is not a directory",
                ))
            }
            Err(_) => {}
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o775);

        builder.create(dir).await.map_err(|e| {
            ConvertError::invalid_target_directory(dir, format!("cannot create directory: {}", e))
        })?;
        debug!(dir = %dir.display(), "Created target directory");
        Ok(())
    }

    /// Creates and removes a uniquely named file in `dir`.
    async fn probe_writable(&self, dir: &Path) -> Result<(), ConvertError> {
        let probe = dir.join(format!(".convertino-probe-{}", uuid::Uuid::new_v4().simple()));
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&probe)
            .await
            .map_err(|e| {
                ConvertError::invalid_target_directory(dir, format!("directory is not writable: {}", e))
            })?;
        // A leftover probe file is harmless.
        let _ = fs::remove_file(&probe).await;
        Ok(())
    }
}
