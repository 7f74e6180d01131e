//! YouTube adapter.
//!
//! Metadata comes from the InnerTube `player` endpoint using a client
//! profile whose stream URLs are directly fetchable (no signature
//! deciphering). The best audio-bearing format is streamed to a raw temp
//! file and transcoded to MP3.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use tunegrab_types::Platform;

use crate::download::{TempFileGuard, stream_to_file, unique_path};
use crate::links::{extract_video_id, sanitize_file_name};
use crate::transcode::Transcoder;
use crate::types::{AudioAdapter, DownloadError, LocalFile};

pub const DEFAULT_API_BASE: &str = "https://www.youtube.com";

const CLIENT_NAME: &str = "ANDROID_VR";
const CLIENT_VERSION: &str = "1.60.19";
const CLIENT_USER_AGENT: &str = "com.google.android.apps.youtube.vr.oculus/1.60.19 \
     (Linux; U; Android 12L; eureka-user Build/SQ3A.220605.009.A1) gzip";

/// A downloadable stream declared by the player response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub itag: u32,
    pub url: String,
    pub mime_type: String,
    pub bitrate: u64,
    pub audio_channels: u32,
    pub content_length: Option<u64>,
}

/// Title and candidate formats of one video.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub title: String,
    pub formats: Vec<AudioFormat>,
}

/// Highest-bitrate format with at least one audio channel. The first
/// format seen wins a tie.
pub fn select_best_audio(formats: &[AudioFormat]) -> Option<&AudioFormat> {
    let mut best: Option<&AudioFormat> = None;
    for format in formats.iter().filter(|f| f.audio_channels > 0) {
        if best.is_none_or(|b| format.bitrate > b.bitrate) {
            best = Some(format);
        }
    }
    best
}

// ──────────────────── InnerTube wire types ────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    video_details: Option<VideoDetails>,
    #[serde(default)]
    streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingData {
    #[serde(default)]
    formats: Vec<RawFormat>,
    #[serde(default)]
    adaptive_formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormat {
    itag: u32,
    /// Absent when the stream needs signature deciphering.
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    bitrate: u64,
    #[serde(default)]
    audio_channels: Option<u32>,
    /// Decimal string.
    #[serde(default)]
    content_length: Option<String>,
}

fn video_info_from(resp: PlayerResponse) -> Result<VideoInfo, DownloadError> {
    match resp.playability_status {
        Some(ps) if ps.status == "OK" => {}
        Some(ps) => {
            return Err(DownloadError::VideoUnavailable(
                ps.reason.unwrap_or(ps.status),
            ));
        }
        None => {
            return Err(DownloadError::VideoUnavailable(
                "player response has no playability status".into(),
            ));
        }
    }

    let streaming = resp.streaming_data.unwrap_or_default();
    let formats = streaming
        .formats
        .into_iter()
        .chain(streaming.adaptive_formats)
        .filter_map(|f| {
            Some(AudioFormat {
                itag: f.itag,
                url: f.url?,
                mime_type: f.mime_type,
                bitrate: f.bitrate,
                audio_channels: f.audio_channels.unwrap_or(0),
                content_length: f.content_length.and_then(|c| c.parse().ok()),
            })
        })
        .collect();

    Ok(VideoInfo {
        title: resp.video_details.map(|d| d.title).unwrap_or_default(),
        formats,
    })
}

// ──────────────────── Adapter ────────────────────

/// YouTube [`AudioAdapter`].
pub struct YouTubeAdapter {
    client: Client,
    api_base: String,
    temp_dir: PathBuf,
    budget: Duration,
    transcoder: Transcoder,
}

impl YouTubeAdapter {
    /// `budget` bounds metadata fetch plus stream download together.
    pub fn new(temp_dir: impl Into<PathBuf>, budget: Duration, transcoder: Transcoder) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            temp_dir: temp_dir.into(),
            budget,
            transcoder,
        }
    }

    /// Point metadata requests at a different host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch title and stream formats for `video_id`.
    pub async fn fetch_video(&self, video_id: &str) -> Result<VideoInfo, DownloadError> {
        let body = json!({
            "videoId": video_id,
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                    "deviceMake": "Oculus",
                    "deviceModel": "Quest 3",
                    "androidSdkVersion": 32,
                    "osName": "Android",
                    "osVersion": "12L",
                    "hl": "en",
                    "gl": "US",
                }
            },
            "contentCheckOk": true,
            "racyCheckOk": true,
        });

        let resp = self
            .client
            .post(format!("{}/youtubei/v1/player?prettyPrint=false", self.api_base))
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| DownloadError::VideoUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DownloadError::VideoUnavailable(format!(
                "player request returned {}",
                resp.status()
            )));
        }

        let player: PlayerResponse = resp
            .json()
            .await
            .map_err(|e| DownloadError::VideoUnavailable(e.to_string()))?;
        video_info_from(player)
    }

    /// Fetch metadata, pick a format and stream it to `dest`. Returns the
    /// video title.
    async fn fetch_and_download(
        &self,
        video_id: &str,
        dest: &Path,
    ) -> Result<String, DownloadError> {
        let video = self.fetch_video(video_id).await?;
        let format = select_best_audio(&video.formats).ok_or(DownloadError::NoAudioStream)?;
        debug!(
            video_id,
            itag = format.itag,
            bitrate = format.bitrate,
            mime_type = %format.mime_type,
            content_length = ?format.content_length,
            "Selected audio format"
        );

        let resp = self
            .client
            .get(&format.url)
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|e| DownloadError::DownloadFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DownloadError::DownloadFailed(format!(
                "stream request returned {}",
                resp.status()
            )));
        }

        stream_to_file(resp, dest, None).await?;
        Ok(video.title)
    }
}

#[async_trait]
impl AudioAdapter for YouTubeAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn resolve(&self, url: &str) -> Result<LocalFile, DownloadError> {
        let video_id = extract_video_id(url)
            .ok_or_else(|| DownloadError::VideoUnavailable("link has no video id".into()))?;

        let raw = TempFileGuard::new(
            self.temp_dir
                .join(format!("youtube_{}.m4a", Uuid::new_v4().simple())),
        );

        let title = tokio::time::timeout(
            self.budget,
            self.fetch_and_download(&video_id, raw.path()),
        )
        .await
        .map_err(|_| DownloadError::DownloadFailed(format!("timed out after {:?}", self.budget)))??;

        let stem = sanitize_file_name(&title);
        let output = TempFileGuard::new(unique_path(&self.temp_dir, &stem, "mp3"));
        self.transcoder.to_mp3(raw.path(), output.path()).await?;
        let size = tokio::fs::metadata(output.path()).await?.len();

        info!(video_id, file = %stem, size, "YouTube download converted");
        Ok(LocalFile {
            path: output.keep(),
            file_name: format!("{stem}.mp3"),
            size,
        })
    }
}
