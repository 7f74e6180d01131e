//! Telegram long-polling loop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tunegrab_types::ChatEvent;

use crate::api::TelegramApi;
use crate::types::{GetUpdatesParams, TgMessage};

const POLL_TIMEOUT_SECS: i64 = 30;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Convert a message into a chat event. Messages without text yield `None`.
pub fn to_chat_event(msg: TgMessage) -> Option<ChatEvent> {
    let command = msg.command();
    let text = msg.text?;
    let chat_id = msg.chat.id;
    let user_id = msg.from.as_ref().map(|u| u.id).unwrap_or(chat_id);
    Some(ChatEvent {
        user_id,
        chat_id,
        text,
        command,
    })
}

/// Run the long-polling loop, forwarding text messages as [`ChatEvent`]s.
///
/// Exits when `cancel` is cancelled or the `sender` is closed.
pub async fn run_polling_loop(
    api: &TelegramApi,
    sender: mpsc::Sender<ChatEvent>,
    cancel: CancellationToken,
) {
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;

    info!("Telegram polling loop started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let params = GetUpdatesParams {
            offset,
            timeout: Some(POLL_TIMEOUT_SECS),
            allowed_updates: Some(vec!["message".into()]),
        };

        let updates = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.get_updates(&params) => result,
        };

        match updates {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;

                for update in updates {
                    offset = Some(update.update_id + 1);

                    let Some(event) = update.message.and_then(to_chat_event) else {
                        continue;
                    };

                    debug!(
                        update_id = update.update_id,
                        chat_id = event.chat_id,
                        user_id = event.user_id,
                        "Forwarding Telegram message"
                    );

                    if sender.send(event).await.is_err() {
                        info!("Inbound channel closed, stopping polling");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(backoff_secs = backoff.as_secs(), "getUpdates error: {e:#}");

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {},
                }

                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }

    info!("Telegram polling loop stopped");
}
