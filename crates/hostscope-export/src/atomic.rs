//! Atomic file replacement

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ExportError;

/// Write `contents` to `target` through a synced temporary sibling
///
/// Missing parent directories are created. The temporary file lives in the
/// target's directory so the final rename never crosses filesystems.
///
/// # Errors
/// Returns an error if the target has no file name or any filesystem step
/// fails. The previous target content is untouched on error.
pub async fn atomic_write(target: &Path, contents: Vec<u8>) -> Result<(), ExportError> {
    let target = target.to_path_buf();
    tokio::task::spawn_blocking(move || write_blocking(&target, &contents))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?
}

fn write_blocking(target: &Path, contents: &[u8]) -> Result<(), ExportError> {
    if target.file_name().is_none() {
        return Err(ExportError::InvalidTarget(target.display().to_string()));
    }
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| ExportError::Io(e.error))?;

    debug!(path = %target.display(), bytes = contents.len(), "report written");
    Ok(())
}
