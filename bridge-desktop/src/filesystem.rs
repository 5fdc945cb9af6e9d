//! `FileSystemAccess` on top of `tokio::fs`.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bytes::Bytes;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::{debug, trace};

/// Desktop file system.
///
/// Writes land in a sibling temporary file that is then renamed over the
/// target, so a tag rewrite interrupted halfway leaves the original intact.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// `dir/.name.partial` next to `path`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".partial");
    path.with_file_name(name)
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).await?;
        let modified_at = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|since| since.as_secs() as i64);

        Ok(FileMetadata {
            size: meta.len(),
            modified_at,
            is_directory: meta.is_dir(),
        })
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await?;
        debug!(path = %path.display(), size = data.len(), "Read file");
        Ok(data.into())
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(path);
        if let Err(err) = fs::write(&partial, &data).await {
            let _ = fs::remove_file(&partial).await;
            return Err(err.into());
        }
        fs::rename(&partial, path).await?;

        debug!(path = %path.display(), size = data.len(), "Wrote file");
        Ok(())
    }

    async fn open_read_stream(
        &self,
        path: &Path,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let file = fs::File::open(path).await?;
        trace!(path = %path.display(), "Opened read stream");
        Ok(Box::new(file))
    }
}
