//! Write-then-rename helpers.
//!
//! Readers never see a partially written file: content goes to a hidden
//! sibling first and is renamed over the destination once complete.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{self, AsyncWriteExt, BufReader, BufWriter};
use tracing::warn;

/// Hidden, uniquely named file next to `target` on the same filesystem.
pub fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_name = format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple());
    match target.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

/// Renames `temp` over `target`, removing `temp` if the rename fails.
pub async fn persist(temp: &Path, target: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(temp, target).await {
        remove_quietly(temp).await;
        return Err(e);
    }
    Ok(())
}

/// Best-effort removal; failures are logged.
pub async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}

/// Copies `source` to `target` through a temporary sibling.
///
/// Returns the number of bytes copied. The source is never modified.
pub async fn copy_atomically(source: &Path, target: &Path) -> io::Result<u64> {
    let temp = temp_sibling(target);

    let copied = async {
        let mut reader = BufReader::new(File::open(source).await?);
        let mut writer = BufWriter::new(File::create(&temp).await?);
        let bytes = io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;
        writer.get_ref().sync_all().await?;
        Ok::<_, io::Error>(bytes)
    }
    .await;

    match copied {
        Ok(bytes) => {
            persist(&temp, target).await?;
            Ok(bytes)
        }
        Err(e) => {
            remove_quietly(&temp).await;
            Err(e)
        }
    }
}
