//! Shared file plumbing: scoped temp-file cleanup and capped body streaming.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::DownloadError;

/// Removes the wrapped file when dropped unless [`TempFileGuard::keep`] is
/// called first. A file that never got created is not an error.
#[derive(Debug)]
pub struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        // Only `keep` and `drop` take the path, and both consume the guard.
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Disarm the guard and hand the path to the caller.
    pub fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed temp file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), "Failed to remove temp file: {e}"),
        }
    }
}

/// `<dir>/<stem>-<suffix>.<ext>`, unique per call so concurrent jobs
/// producing the same title never share a path.
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let suffix = Uuid::new_v4().simple().to_string();
    dir.join(format!("{stem}-{}.{ext}", &suffix[..8]))
}

/// Stream a response body into `path`, creating the file.
///
/// With `cap = Some(n)`, fails with `TooLarge` as soon as more than `n`
/// bytes arrive. The caller owns cleanup of a partially written file.
pub async fn stream_to_file(
    resp: reqwest::Response,
    path: &Path,
    cap: Option<u64>,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    let mut body = resp.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| DownloadError::DownloadFailed(e.to_string()))?;
        written += chunk.len() as u64;
        if let Some(cap) = cap {
            if written > cap {
                return Err(DownloadError::TooLarge { size: written });
            }
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(written)
}
