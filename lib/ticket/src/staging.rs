//! Client-local staging of files before upload.
//!
//! Files are checked against the size limit when they are staged, long
//! before any network call. The set keeps the order files were added in.

use crate::attachment::MAX_ATTACHMENT_BYTES;
use crate::error::StorageError;
use rootcause::Report;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a staged file's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileSource {
    /// Bytes already in memory.
    Memory(Arc<[u8]>),
    /// A file on local disk, read at upload time.
    Path(PathBuf),
}

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    name: String,
    size: u64,
    content_type: String,
    source: FileSource,
}

impl PendingFile {
    /// Stages in-memory bytes.
    #[must_use]
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: content_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Stages a file from disk. Only metadata is read here.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadFailed` if the file's metadata cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Report<StorageError>> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| StorageError::ReadFailed {
                    file_name: name.clone(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            content_type: content_type_for(&name),
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
            name,
        })
    }

    /// Returns the file name shown to the user and used in the storage path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns true if the file is within the attachment size limit.
    #[must_use]
    pub fn within_limit(&self) -> bool {
        self.size <= MAX_ATTACHMENT_BYTES
    }

    /// Reads the file's content.
    ///
    /// A disk-backed file must still have the size it was staged with, so
    /// the limit checked at staging holds for the bytes actually sent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadFailed` if a disk-backed file cannot be
    /// read, or if its size changed after it was staged.
    pub async fn read(&self) -> Result<Vec<u8>, Report<StorageError>> {
        let bytes = match &self.source {
            FileSource::Memory(bytes) => bytes.to_vec(),
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| StorageError::ReadFailed {
                        file_name: self.name.clone(),
                        message: e.to_string(),
                    })?
            }
        };

        let actual = bytes.len() as u64;
        if actual > MAX_ATTACHMENT_BYTES || actual != self.size {
            return Err(StorageError::ReadFailed {
                file_name: self.name.clone(),
                message: format!("staged at {} bytes, now {actual} bytes", self.size),
            }
            .into());
        }
        Ok(bytes)
    }
}

/// Guesses a MIME type from a file name's extension.
fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}

/// Ordered set of files staged for the next submission.
#[derive(Debug, Clone, Default)]
pub struct PendingFileSet {
    files: Vec<PendingFile>,
}

impl PendingFileSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the candidates that fit the size limit, keeping their order.
    ///
    /// Returns the candidates that were rejected for being too large.
    pub fn add(&mut self, candidates: impl IntoIterator<Item = PendingFile>) -> Vec<PendingFile> {
        let mut rejected = Vec::new();
        for file in candidates {
            if file.within_limit() {
                self.files.push(file);
            } else {
                rejected.push(file);
            }
        }
        rejected
    }

    /// Removes the file at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Removes the first `count` files, keeping any staged after them.
    pub fn remove_front(&mut self, count: usize) {
        self.files.drain(..count.min(self.files.len()));
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingFile> {
        self.files.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PendingFile] {
        &self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> PendingFile {
        PendingFile::from_bytes(name, "application/octet-stream", vec![0u8; size])
    }

    fn names(set: &PendingFileSet) -> Vec<&str> {
        set.iter().map(PendingFile::name).collect()
    }

    #[test]
    fn oversized_files_are_rejected_and_order_kept() {
        let mut set = PendingFileSet::new();
        let rejected = set.add(vec![
            file("a.png", 10),
            file("huge.mov", (MAX_ATTACHMENT_BYTES + 1) as usize),
            file("b.pdf", 20),
        ]);

        assert_eq!(names(&set), ["a.png", "b.pdf"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].name(), "huge.mov");
    }

    #[test]
    fn file_exactly_at_limit_is_accepted() {
        let mut set = PendingFileSet::new();
        let rejected = set.add([file("edge.bin", MAX_ATTACHMENT_BYTES as usize)]);
        assert!(rejected.is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_preserves_order_and_ignores_bad_index() {
        let mut set = PendingFileSet::new();
        set.add([file("a", 1), file("b", 1), file("c", 1)]);

        assert_eq!(set.remove(1).map(|f| f.name().to_string()), Some("b".into()));
        assert!(set.remove(7).is_none());
        assert_eq!(names(&set), ["a", "c"]);

        set.clear();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn disk_file_is_staged_by_metadata_and_read_later() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Brief.PDF");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let staged = PendingFile::from_path(&path).await.unwrap();

        assert_eq!(staged.name(), "Brief.PDF");
        assert_eq!(staged.size(), 8);
        assert_eq!(staged.content_type(), "application/pdf");
        assert_eq!(staged.read().await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn missing_disk_file_fails_to_stage() {
        let dir = tempfile::tempdir().unwrap();
        let err = PendingFile::from_path(dir.path().join("nope.png"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            StorageError::ReadFailed { file_name, .. } if file_name == "nope.png"
        ));
    }

    #[test]
    fn remove_front_keeps_files_staged_later() {
        let mut set = PendingFileSet::new();
        set.add([file("a", 1), file("b", 1), file("c", 1)]);

        set.remove_front(2);
        assert_eq!(names(&set), ["c"]);

        set.remove_front(5);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn disk_file_that_grew_past_the_limit_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.bin");
        std::fs::write(&path, b"12345").unwrap();

        let staged = PendingFile::from_path(&path).await.unwrap();
        assert!(staged.within_limit());
        std::fs::write(&path, vec![0u8; MAX_ATTACHMENT_BYTES as usize + 1]).unwrap();

        let err = staged.read().await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            StorageError::ReadFailed { file_name, .. } if file_name == "grow.bin"
        ));
    }

    #[tokio::test]
    async fn disk_file_that_changed_size_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"draft").unwrap();

        let staged = PendingFile::from_path(&path).await.unwrap();
        std::fs::write(&path, b"dr").unwrap();

        assert!(staged.read().await.is_err());
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(content_type_for("export.lmx"), "application/octet-stream");
        assert_eq!(content_type_for("README"), "application/octet-stream");
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
    }
}
