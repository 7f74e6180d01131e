//! Telegram Bot API types (the subset the bot touches).

use serde::{Deserialize, Serialize};

/// Generic Telegram API response wrapper.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Bot identity returned by `getMe`.
#[derive(Debug, Deserialize)]
pub struct BotInfo {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A Telegram Update object.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

/// A Telegram message.
#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub date: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

impl TgMessage {
    /// Command name for messages starting with a `bot_command` entity:
    /// `/start` → `start`, `/start@tunegrab_bot` → `start`.
    pub fn command(&self) -> Option<String> {
        let text = self.text.as_deref()?;
        let leading = self
            .entities
            .iter()
            .any(|e| e.entity_type == "bot_command" && e.offset == 0);
        if !leading {
            return None;
        }
        let cmd = text
            .split_whitespace()
            .next()?
            .trim_start_matches('/')
            .split('@')
            .next()?;
        (!cmd.is_empty()).then(|| cmd.to_string())
    }
}

/// A message entity (bold, command, mention, etc.).
#[derive(Debug, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub offset: i64,
    pub length: i64,
}

/// A Telegram user.
#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A Telegram chat.
#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Parameters for `getUpdates`.
#[derive(Debug, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

/// Custom keyboard replacing the user's input keyboard.
#[derive(Debug, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// One row with a button per label, hidden after the first tap.
    pub fn single_row(labels: &[&str]) -> Self {
        Self {
            keyboard: vec![labels.iter().map(|l| KeyboardButton::new(l)).collect()],
            resize_keyboard: true,
            one_time_keyboard: true,
        }
    }
}

/// A reply keyboard button. Tapping it sends `text` as a message.
#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok() {
        let json = r#"{"ok":true,"result":{"id":123,"is_bot":true,"first_name":"TuneGrab","username":"tunegrab_bot"}}"#;
        let resp: ApiResponse<BotInfo> = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        let bot = resp.result.unwrap();
        assert_eq!(bot.id, 123);
        assert_eq!(bot.username.as_deref(), Some("tunegrab_bot"));
    }

    #[test]
    fn test_api_response_error() {
        let json = r#"{"ok":false,"description":"Unauthorized"}"#;
        let resp: ApiResponse<BotInfo> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_update_with_message() {
        let json = r#"{
            "update_id": 100,
            "message": {
                "message_id": 1,
                "date": 1700000000,
                "from": {"id": 42, "is_bot": false, "first_name": "Sam"},
                "chat": {"id": 4200, "type": "private"},
                "text": "https://youtu.be/dQw4w9WgXcQ"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 100);
        let msg = update.message.unwrap();
        assert_eq!(msg.text.as_deref(), Some("https://youtu.be/dQw4w9WgXcQ"));
        assert_eq!(msg.from.unwrap().id, 42);
        assert_eq!(msg.chat.id, 4200);
        assert!(msg.entities.is_empty());
    }

    #[test]
    fn test_update_without_message() {
        let json = r#"{"update_id": 200}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 200);
        assert!(update.message.is_none());
    }

    fn command_message(text: &str, offset: i64) -> TgMessage {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 1, "type": "private"},
            "text": text,
            "entities": [{"type": "bot_command", "offset": offset, "length": 6}],
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_command_detection() {
        assert_eq!(command_message("/start", 0).command().as_deref(), Some("start"));
        assert_eq!(
            command_message("/start@tunegrab_bot now", 0).command().as_deref(),
            Some("start")
        );
        // command not at the start of the message
        assert_eq!(command_message("hi /start", 3).command(), None);
    }

    #[test]
    fn test_send_message_params_skip_none() {
        let params = SendMessageParams {
            chat_id: 42,
            text: "Hello".into(),
            reply_markup: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert!(!json.as_object().unwrap().contains_key("reply_markup"));
    }

    #[test]
    fn test_keyboard_serialize() {
        let params = SendMessageParams {
            chat_id: 42,
            text: "Choose".into(),
            reply_markup: Some(ReplyKeyboardMarkup::single_row(&["YouTube", "SoundCloud"])),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json["reply_markup"],
            serde_json::json!({
                "keyboard": [[{"text": "YouTube"}, {"text": "SoundCloud"}]],
                "resize_keyboard": true,
                "one_time_keyboard": true,
            })
        );
    }
}
