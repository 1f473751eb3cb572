//! A single download attempt.
//!
//! [`HttpTransfer`] issues the GET, makes sure the ancestor directories of
//! the destination exist, and streams the body into `<destination>.part`
//! before renaming it over the destination. A destination therefore only
//! ever holds a complete body: an aborted or failed attempt leaves the
//! previous content (if any) in place and removes its partial file.

use crate::error::{Error, Result};
use crate::http::{create_http_client, HttpClientConfig};
use crate::task::DownloadTask;

use futures::StreamExt;
use reqwest_middleware::ClientWithMiddleware;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

/// One attempt at performing a [`DownloadTask`].
///
/// The retrying logic lives in [`RetryingFetcher`](super::RetryingFetcher);
/// implementations only have to report whether this particular attempt worked.
pub trait Transfer: Send + Sync {
    /// Perform one attempt.
    fn transfer(&self, task: &DownloadTask) -> impl Future<Output = Result<()>> + Send;
}

/// HTTP implementation of [`Transfer`].
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: ClientWithMiddleware,
}

impl HttpTransfer {
    /// Wrap an existing client.
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self { client }
    }

    /// Build the client from its configuration.
    pub fn from_config(config: HttpClientConfig) -> Result<Self> {
        Ok(Self::new(create_http_client(config)?))
    }
}

impl Transfer for HttpTransfer {
    async fn transfer(&self, task: &DownloadTask) -> Result<()> {
        debug!("Fetching {}", &task.source_url);
        let res = self.client.get(task.source_url.clone()).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: task.source_url.to_string(),
                status,
            });
        }

        if let Some(output_dir) = task
            .destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            debug!("Creating destination directory {:?}", output_dir);
            fs::create_dir_all(output_dir)
                .await
                .map_err(|source| Error::CreateDirectory {
                    path: output_dir.to_path_buf(),
                    source,
                })?;
        }

        let part = PartFile::for_destination(&task.destination);
        debug!("Creating destination file {:?}", part.path());
        let mut file = fs::File::create(part.path())
            .await
            .map_err(|source| Error::CreateFile {
                path: part.path().to_path_buf(),
                source,
            })?;

        let mut stream = res.bytes_stream();
        while let Some(item) = stream.next().await {
            let mut chunk = item?;
            file.write_all_buf(&mut chunk)
                .await
                .map_err(|source| part.write_error(source))?;
        }
        file.flush().await.map_err(|source| part.write_error(source))?;
        drop(file);

        part.commit(&task.destination).await
    }
}

/// Partial file that is removed on drop unless committed.
#[derive(Debug)]
struct PartFile {
    path: PathBuf,
    committed: bool,
}

impl PartFile {
    fn for_destination(destination: &Path) -> Self {
        let mut name = destination
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".part");
        Self {
            path: destination.with_file_name(name),
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> Error {
        Error::Write {
            path: self.path.clone(),
            source,
        }
    }

    async fn commit(mut self, destination: &Path) -> Result<()> {
        fs::rename(&self.path, destination)
            .await
            .map_err(|source| Error::Write {
                path: destination.to_path_buf(),
                source,
            })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_file_name() {
        let part = PartFile::for_destination(Path::new("out/dir/file.pdf"));
        assert_eq!(part.path(), Path::new("out/dir/file.pdf.part"));
    }

    #[test]
    fn test_part_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("file.bin");
        let part = PartFile::for_destination(&destination);
        std::fs::write(part.path(), b"half").unwrap();
        let part_path = part.path().to_path_buf();

        drop(part);
        assert!(!part_path.exists());
    }

    #[tokio::test]
    async fn test_part_file_commit() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("file.bin");
        std::fs::write(&destination, b"old").unwrap();

        let part = PartFile::for_destination(&destination);
        std::fs::write(part.path(), b"new").unwrap();
        let part_path = part.path().to_path_buf();
        part.commit(&destination).await.unwrap();

        assert!(!part_path.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"new");
    }
}
