//! Download result, error taxonomy and the adapter trait.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use tunegrab_types::Platform;

/// Errors surfaced by adapters and the orchestrator.
///
/// `Display` output is shown to the user verbatim after an error prefix.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("video unavailable: {0}")]
    VideoUnavailable(String),
    #[error("no audio stream found")]
    NoAudioStream,
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("conversion failed: {0}")]
    ConversionFailed(String),
    #[error("page not found (status {0})")]
    PageUnavailable(u16),
    #[error("download is not available for this track")]
    ScrapeFailed,
    #[error("file is too large ({}MB)", .size / 1024 / 1024)]
    TooLarge { size: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A produced audio file waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Location in the working temp directory.
    pub path: PathBuf,
    /// Name presented to the user on upload.
    pub file_name: String,
    /// Size in bytes at the time the file was produced.
    pub size: u64,
}

/// Resolves a platform link into a local audio file.
///
/// Implementations own the scrape/fetch strategy for one platform; the
/// orchestrator only routes by [`AudioAdapter::platform`].
#[async_trait]
pub trait AudioAdapter: Send + Sync {
    /// Platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Fetch `url` and produce a local file.
    async fn resolve(&self, url: &str) -> Result<LocalFile, DownloadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_in_megabytes() {
        let err = DownloadError::TooLarge {
            size: 60 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "file is too large (60MB)");
    }

    #[test]
    fn test_page_unavailable_message() {
        assert_eq!(
            DownloadError::PageUnavailable(404).to_string(),
            "page not found (status 404)"
        );
    }
}
