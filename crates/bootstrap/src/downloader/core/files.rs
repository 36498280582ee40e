//! File operation utilities
//!
//! Shared by the HTTP backend and the mirror loop so that destination
//! handling stays consistent.

use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::downloader::core::{DownloadError, FileOperation, Result};

/// Create every missing parent directory of `dest_path`
pub async fn ensure_parent_dir(dest_path: &Path) -> Result<()> {
    let Some(parent) = dest_path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent)
        .await
        .map_err(|e| DownloadError::file_system(parent, FileOperation::CreateDir, e))
}

/// Remove a partially written destination after a failed attempt.
///
/// A file that was never created is not an error.
pub async fn remove_partial(dest_path: &Path) -> Result<()> {
    match fs::remove_file(dest_path).await {
        Ok(()) => {
            debug!("Removed partial file {}", dest_path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DownloadError::file_system(dest_path, FileOperation::Delete, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn creates_nested_parents() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("a/b/c/file.zip");

        ensure_parent_dir(&dest).await.unwrap();

        assert!(temp_dir.path().join("a/b/c").is_dir());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn bare_file_name_needs_no_parent() {
        ensure_parent_dir(Path::new("file.zip")).await.unwrap();
    }

    #[tokio::test]
    async fn removing_missing_file_is_ok() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("never-written.zip");

        remove_partial(&dest).await.unwrap();
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn removes_existing_partial() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("partial.zip");
        fs::write(&dest, b"half").await.unwrap();

        remove_partial(&dest).await.unwrap();
        assert!(!dest.exists());
    }
}
