//! tunegrab-types: platform tags and chat events shared across the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

// ──────────────────── Platform Types ────────────────────

/// Source platform a submitted link is downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    SoundCloud,
}

impl Platform {
    /// All platforms, in the order they are offered to the user.
    pub const ALL: [Platform; 2] = [Platform::YouTube, Platform::SoundCloud];

    /// Button label shown in the platform prompt. Also the exact text
    /// the user sends back when choosing.
    pub fn label(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::SoundCloud => "SoundCloud",
        }
    }

    /// Map a reply to a platform choice. Matching is exact and case-sensitive.
    pub fn from_choice(text: &str) -> Option<Platform> {
        Self::ALL.into_iter().find(|p| p.label() == text)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ──────────────────── Channel Types ────────────────────

/// A text message received from the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatEvent {
    /// Sender's user id on the chat platform.
    pub user_id: i64,
    /// Chat the message arrived in; replies go here.
    pub chat_id: i64,
    /// Raw message text.
    pub text: String,
    /// Bot command name without the leading slash or `@botname` suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Status of a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Channel is not running.
    Stopped,
    /// Channel is initializing.
    Starting,
    /// Channel is running and accepting messages.
    Running,
    /// Channel encountered an error.
    Error(String),
}
