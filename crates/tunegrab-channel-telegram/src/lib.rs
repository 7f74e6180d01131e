//! Telegram transport for tunegrab.
//!
//! Uses the Bot API with long-polling (no webhook required). Inbound text
//! messages become [`ChatEvent`]s; outbound calls map onto `sendMessage`
//! and `sendAudio`.
//!
//! # Configuration
//!
//! ```json5
//! telegram: {
//!     bot_token: "123456:ABC-DEF...",   // or TELEGRAM_TOKEN
//!     api_base: "https://api.telegram.org",
//! }
//! ```

pub mod api;
pub mod polling;
pub mod types;

use std::sync::Arc;

use anyhow::bail;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tunegrab_gateway::ChatTransport;
use tunegrab_media::LocalFile;
use tunegrab_types::{ChannelStatus, ChatEvent};

use api::TelegramApi;
use types::{ReplyKeyboardMarkup, SendMessageParams};

/// Telegram transport: owns the polling task and answers outbound calls.
pub struct TelegramChannel {
    api: Arc<TelegramApi>,
    state: Mutex<TelegramState>,
}

struct TelegramState {
    status: ChannelStatus,
    cancel: Option<CancellationToken>,
    poll_handle: Option<JoinHandle<()>>,
}

impl TelegramChannel {
    pub fn new(api: TelegramApi) -> Self {
        Self {
            api: Arc::new(api),
            state: Mutex::new(TelegramState {
                status: ChannelStatus::Stopped,
                cancel: None,
                poll_handle: None,
            }),
        }
    }

    /// Verify the token with `getMe`, then start polling into `sender`.
    pub async fn start(&self, sender: mpsc::Sender<ChatEvent>) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state.status == ChannelStatus::Running {
            bail!("Telegram channel is already running");
        }

        state.status = ChannelStatus::Starting;

        match self.api.get_me().await {
            Ok(bot) => {
                info!(
                    bot_username = bot.username.as_deref().unwrap_or("unknown"),
                    "Telegram bot authenticated"
                );
            }
            Err(e) => {
                state.status = ChannelStatus::Error(format!("Auth failed: {e}"));
                bail!("Failed to authenticate Telegram bot: {e}");
            }
        }

        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();
        let api = self.api.clone();

        let handle = tokio::spawn(async move {
            polling::run_polling_loop(&api, sender, cancel_child).await;
        });

        state.cancel = Some(cancel);
        state.poll_handle = Some(handle);
        state.status = ChannelStatus::Running;

        Ok(())
    }

    /// Stop polling and wait for the task to finish.
    pub async fn stop(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;

        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }

        if let Some(handle) = state.poll_handle.take() {
            let _ = handle.await;
        }

        state.status = ChannelStatus::Stopped;
        Ok(())
    }

    pub fn status(&self) -> ChannelStatus {
        match self.state.try_lock() {
            Ok(state) => state.status.clone(),
            Err(_) => ChannelStatus::Starting,
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.api
            .send_message(&SendMessageParams {
                chat_id,
                text: text.to_string(),
                reply_markup: None,
            })
            .await?;
        Ok(())
    }

    async fn send_choice_prompt(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[&str],
    ) -> anyhow::Result<()> {
        self.api
            .send_message(&SendMessageParams {
                chat_id,
                text: text.to_string(),
                reply_markup: Some(ReplyKeyboardMarkup::single_row(choices)),
            })
            .await?;
        Ok(())
    }

    async fn send_audio(&self, chat_id: i64, file: &LocalFile) -> anyhow::Result<()> {
        self.api
            .send_audio(chat_id, &file.path, &file.file_name)
            .await?;
        Ok(())
    }
}
