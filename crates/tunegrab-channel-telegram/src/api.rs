//! Telegram Bot API HTTP client.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{ApiResponse, BotInfo, GetUpdatesParams, SendMessageParams, TgMessage, Update};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Covers a 30 s long poll plus slack.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for the Telegram Bot API.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// Create a new API client with the given bot token.
    pub fn new(bot_token: &str) -> anyhow::Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, bot_token)
    }

    /// Client against a custom API host (local Bot API server, tests).
    pub fn with_api_base(api_base: &str, bot_token: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{bot_token}", api_base.trim_end_matches('/')),
        })
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn get_me(&self) -> anyhow::Result<BotInfo> {
        let resp: ApiResponse<BotInfo> = self
            .client
            .get(format!("{}/getMe", self.base_url))
            .send()
            .await
            .context("getMe request failed")?
            .json()
            .await
            .context("getMe response parse failed")?;

        unwrap_result("getMe", resp)
    }

    /// Long-poll for updates.
    pub async fn get_updates(&self, params: &GetUpdatesParams) -> anyhow::Result<Vec<Update>> {
        let resp: ApiResponse<Vec<Update>> = self.post_json("getUpdates", params).await?;
        if !resp.ok {
            bail!("getUpdates failed: {}", describe(resp.description));
        }
        Ok(resp.result.unwrap_or_default())
    }

    /// Send a text message, optionally with a reply keyboard.
    pub async fn send_message(&self, params: &SendMessageParams) -> anyhow::Result<TgMessage> {
        let resp = self.post_json("sendMessage", params).await?;
        unwrap_result("sendMessage", resp)
    }

    /// Upload a local audio file. `file_name` is what the user sees.
    pub async fn send_audio(
        &self,
        chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> anyhow::Result<TgMessage> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("audio", part);

        let resp: ApiResponse<TgMessage> = self
            .client
            .post(format!("{}/sendAudio", self.base_url))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .context("sendAudio request failed")?
            .json()
            .await
            .context("sendAudio response parse failed")?;

        unwrap_result("sendAudio", resp)
    }

    async fn post_json<P, R>(&self, method: &str, params: &P) -> anyhow::Result<ApiResponse<R>>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.client
            .post(format!("{}/{method}", self.base_url))
            .json(params)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .json()
            .await
            .with_context(|| format!("{method} response parse failed"))
    }
}

fn unwrap_result<T>(method: &str, resp: ApiResponse<T>) -> anyhow::Result<T> {
    if !resp.ok {
        bail!("{method} failed: {}", describe(resp.description));
    }
    resp.result
        .with_context(|| format!("{method} returned no result"))
}

fn describe(description: Option<String>) -> String {
    description.unwrap_or_else(|| "unknown error".into())
}
