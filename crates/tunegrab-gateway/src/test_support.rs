//! Test doubles shared by the gateway's unit tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::bail;
use tokio::sync::Mutex;

use tunegrab_media::{AudioAdapter, DownloadError, LocalFile};
use tunegrab_types::Platform;

use crate::transport::ChatTransport;

/// Something the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Text {
        chat_id: i64,
        text: String,
    },
    Prompt {
        chat_id: i64,
        text: String,
        choices: Vec<String>,
    },
    Audio {
        chat_id: i64,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Records every outbound call. Uploads read the file at send time.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    pub(crate) sent: Mutex<Vec<Sent>>,
    pub(crate) fail_uploads: AtomicBool,
}

impl RecordingTransport {
    pub(crate) async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub(crate) async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.sent.lock().await.push(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_choice_prompt(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[&str],
    ) -> anyhow::Result<()> {
        self.sent.lock().await.push(Sent::Prompt {
            chat_id,
            text: text.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        });
        Ok(())
    }

    async fn send_audio(&self, chat_id: i64, file: &LocalFile) -> anyhow::Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            bail!("upload rejected");
        }
        let bytes = tokio::fs::read(&file.path).await?;
        self.sent.lock().await.push(Sent::Audio {
            chat_id,
            file_name: file.file_name.clone(),
            bytes,
        });
        Ok(())
    }
}

/// Adapter that writes a fixed payload into a directory, or fails.
pub(crate) struct FakeAdapter {
    pub(crate) platform: Platform,
    pub(crate) dir: PathBuf,
    pub(crate) fail_with: Option<fn() -> DownloadError>,
}

#[async_trait::async_trait]
impl AudioAdapter for FakeAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn resolve(&self, url: &str) -> Result<LocalFile, DownloadError> {
        if let Some(make_err) = self.fail_with {
            return Err(make_err());
        }
        let path = self.dir.join(format!("{}.mp3", self.platform));
        let payload = format!("audio for {url}");
        tokio::fs::write(&path, &payload).await?;
        Ok(LocalFile {
            path,
            file_name: "Track.mp3".into(),
            size: payload.len() as u64,
        })
    }
}
