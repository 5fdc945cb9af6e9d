//! File access as the format subsystem needs it.
//!
//! Project loads read the same file twice through independent streams; tag
//! edits read a whole file, rewrite it in memory and store it back.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// What the host knows about a path.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    /// Seconds since the Unix epoch, when the platform reports it.
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// Host file system.
///
/// The desktop shell backs this with the real file system; a web host can
/// serve blobs handed over by a file picker.
///
/// ```ignore
/// let stream = fs.open_read_stream(Path::new("take.recwerk")).await?;
/// let total = fs.size_hint(Path::new("take.recwerk")).await;
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Whole file in memory. Meant for exported audio, not projects.
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Replace the file's contents, creating it and its parent directories.
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// A fresh reader positioned at offset 0.
    ///
    /// Readers returned by separate calls never share a cursor.
    async fn open_read_stream(
        &self,
        path: &Path,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;

    /// Byte length for progress reporting.
    ///
    /// `None` for directories, empty files and paths that cannot be
    /// inspected.
    async fn size_hint(&self, path: &Path) -> Option<u64> {
        self.metadata(path)
            .await
            .ok()
            .filter(|meta| !meta.is_directory && meta.size > 0)
            .map(|meta| meta.size)
    }
}
