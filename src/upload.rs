//! Request-scoped storage for uploaded files.
//!
//! An upload lives in a uniquely named file inside the configured upload directory for as long
//! as its [`ScopedUpload`] is alive. Dropping the guard deletes the file on every exit path
//! (success, extraction failure, early return, panic unwinding). Deletion failures are logged
//! and never surface to the caller.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Temporary upload that is removed when dropped.
#[derive(Debug)]
pub struct ScopedUpload {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl ScopedUpload {
    /// Persist `bytes` into a fresh file under `dir`, creating the directory if needed.
    pub fn create(dir: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        let path = file.path().to_path_buf();
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored upload");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// Location of the stored upload.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedUpload {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        match file.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed upload"),
            Err(err) => tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to remove temporary upload"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|iter| iter.count()).unwrap_or(0)
    }

    #[test]
    fn upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let upload_dir = dir.path().join("uploads");
        let upload = ScopedUpload::create(&upload_dir, b"%PDF-1.4").expect("upload");
        assert!(upload.path().exists());
        assert_eq!(std::fs::read(upload.path()).expect("read"), b"%PDF-1.4");
        assert_eq!(entries(&upload_dir), 1);

        drop(upload);
        assert_eq!(entries(&upload_dir), 0);
    }

    #[test]
    fn cleanup_tolerates_file_removed_externally() {
        let dir = tempfile::tempdir().expect("temp dir");
        let upload = ScopedUpload::create(dir.path(), b"bytes").expect("upload");
        std::fs::remove_file(upload.path()).expect("remove");
        drop(upload);
        assert_eq!(entries(dir.path()), 0);
    }
}
