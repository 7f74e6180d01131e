//! SoundCloud adapter: scrapes a track page for its direct download URL.
//!
//! Only tracks whose uploader enabled downloads expose `download_url` in
//! the page's hydration JSON; everything else fails with `ScrapeFailed`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use tunegrab_types::Platform;

use crate::download::{TempFileGuard, stream_to_file, unique_path};
use crate::links::{SOUNDCLOUD_MARKERS, extract_url, sanitize_file_name};
use crate::types::{AudioAdapter, DownloadError, LocalFile};

/// Title used when the page carries a download URL but no title.
pub const FALLBACK_TITLE: &str = "soundcloud_track";

static DOWNLOAD_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""download_url":"([^"]+)""#).expect("download_url pattern is valid")
});

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""title":"([^"]+)""#).expect("title pattern is valid"));

/// Download URL and title scraped from a track page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedTrack {
    pub download_url: String,
    pub title: String,
}

/// Extract the download URL and title from a track page body.
///
/// The two patterns run independently; a missing title falls back to
/// [`FALLBACK_TITLE`].
pub fn scrape_track(body: &str) -> Result<ScrapedTrack, DownloadError> {
    let download_url = DOWNLOAD_URL_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| unescape_json_url(m.as_str()))
        .ok_or(DownloadError::ScrapeFailed)?;

    let title = TITLE_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    Ok(ScrapedTrack {
        download_url,
        title,
    })
}

fn unescape_json_url(raw: &str) -> String {
    raw.replace("\\u0026", "&").replace("\\/", "/")
}

/// SoundCloud [`AudioAdapter`].
pub struct SoundCloudAdapter {
    client: Client,
    temp_dir: PathBuf,
    page_timeout: Duration,
    max_bytes: u64,
}

impl SoundCloudAdapter {
    pub fn new(temp_dir: impl Into<PathBuf>, page_timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client: Client::new(),
            temp_dir: temp_dir.into(),
            page_timeout,
            max_bytes,
        }
    }

    /// Fetch the public track page and scrape it.
    pub async fn fetch_track(&self, page_url: &str) -> Result<ScrapedTrack, DownloadError> {
        let resp = self
            .client
            .get(page_url)
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| DownloadError::DownloadFailed(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(DownloadError::PageUnavailable(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DownloadError::DownloadFailed(e.to_string()))?;
        scrape_track(&body)
    }

    /// Download `track` into the temp dir, enforcing the size cap.
    pub async fn download(&self, track: &ScrapedTrack) -> Result<LocalFile, DownloadError> {
        let resp = self
            .client
            .get(&track.download_url)
            .send()
            .await
            .map_err(|e| DownloadError::DownloadFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DownloadError::DownloadFailed(format!(
                "server returned {}",
                resp.status()
            )));
        }

        if let Some(declared) = resp.content_length() {
            if declared > self.max_bytes {
                return Err(DownloadError::TooLarge { size: declared });
            }
        }

        let stem = sanitize_file_name(&track.title);
        let guard = TempFileGuard::new(unique_path(&self.temp_dir, &stem, "mp3"));
        let size = stream_to_file(resp, guard.path(), Some(self.max_bytes)).await?;

        Ok(LocalFile {
            path: guard.keep(),
            file_name: format!("{stem}.mp3"),
            size,
        })
    }
}

#[async_trait]
impl AudioAdapter for SoundCloudAdapter {
    fn platform(&self) -> Platform {
        Platform::SoundCloud
    }

    async fn resolve(&self, url: &str) -> Result<LocalFile, DownloadError> {
        let page_url = extract_url(url, SOUNDCLOUD_MARKERS);
        let track = self.fetch_track(&page_url).await?;
        debug!(title = %track.title, "Scraped SoundCloud track");

        let file = self.download(&track).await?;
        info!(file = %file.file_name, size = file.size, "SoundCloud download complete");
        Ok(file)
    }
}
