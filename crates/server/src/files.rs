//! Confines request paths to the configured files root.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

/// Canonical directory that HTTP callers may read from and write into.
#[derive(Debug, Clone)]
pub struct FilesRoot {
    root: PathBuf,
}

/// A request path that resolves outside the files root.
#[derive(Debug, thiserror::Error)]
#[error("path {} is outside the files root", .0.display())]
pub struct OutsideRoot(pub PathBuf);

impl FilesRoot {
    /// Canonicalizes `dir`, which must exist.
    pub async fn open(dir: &Path) -> io::Result<Self> {
        let root = tokio::fs::canonicalize(dir).await?;
        Ok(Self { root })
    }

    /// Creates `dir` when missing, then canonicalizes it.
    pub async fn create(dir: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        Self::open(dir).await
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` against the root and checks that it stays inside.
    ///
    /// Relative paths are joined onto the root. Existing prefixes are
    /// canonicalized so symlinks count where they point. The part that does
    /// not exist yet may not contain `..`.
    pub async fn resolve(&self, path: &Path) -> Result<PathBuf, OutsideRoot> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = canonicalize_existing_prefix(&joined)
            .await
            .ok_or_else(|| OutsideRoot(path.to_path_buf()))?;

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            warn!(path = %path.display(), resolved = %resolved.display(), "Rejected path outside files root");
            Err(OutsideRoot(path.to_path_buf()))
        }
    }
}

/// Canonicalizes the longest existing ancestor of `path` and re-appends the
/// rest. `None` when the missing rest climbs with `..`.
async fn canonicalize_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;

    loop {
        if let Ok(canonical) = tokio::fs::canonicalize(current).await {
            let mut resolved = canonical;
            for component in missing.iter().rev() {
                match component {
                    Component::Normal(part) => resolved.push(part),
                    Component::CurDir => {}
                    _ => return None,
                }
            }
            return Some(resolved);
        }

        let mut components = current.components();
        let last = components.next_back()?;
        missing.push(last);
        current = components.as_path();
        if current.as_os_str().is_empty() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn root_in(dir: &TempDir) -> FilesRoot {
        FilesRoot::create(&dir.path().join("files")).await.unwrap()
    }

    #[tokio::test]
    async fn test_existing_file_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = root_in(&dir).await;
        let file = root.path().join("report.docx");
        std::fs::write(&file, b"docx").unwrap();

        assert_eq!(root.resolve(&file).await.unwrap(), file);
        assert_eq!(root.resolve(Path::new("report.docx")).await.unwrap(), file);
    }

    #[tokio::test]
    async fn test_missing_target_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = root_in(&dir).await;

        let resolved = root.resolve(Path::new("out/./nested/report.pdf")).await.unwrap();
        assert_eq!(resolved, root.path().join("out/nested/report.pdf"));
    }

    #[tokio::test]
    async fn test_paths_outside_root_are_rejected() {
        let dir = TempDir::new().unwrap();
        let root = root_in(&dir).await;
        let secret = dir.path().join("secret.conf");
        std::fs::write(&secret, b"db_password=hunter2").unwrap();

        assert!(root.resolve(&secret).await.is_err());
        assert!(root.resolve(Path::new("../secret.conf")).await.is_err());
        assert!(root
            .resolve(&root.path().join("missing/../../secret.conf"))
            .await
            .is_err());
        assert!(root.resolve(Path::new("/etc/passwd")).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escaping_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = root_in(&dir).await;
        let secret = dir.path().join("secret.conf");
        std::fs::write(&secret, b"db_password=hunter2").unwrap();
        let link = root.path().join("report.pdf");
        std::os::unix::fs::symlink(&secret, &link).unwrap();

        assert!(root.resolve(&link).await.is_err());
    }
}
