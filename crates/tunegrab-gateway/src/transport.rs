//! Outbound seam to the chat platform.
//!
//! Implementations handle platform-specific protocol details; the
//! dispatcher, jobs and delivery sink only see this trait.
//!
//! ```rust,ignore
//! use tunegrab_gateway::ChatTransport;
//!
//! struct TelegramChannel { /* ... */ }
//!
//! #[async_trait::async_trait]
//! impl ChatTransport for TelegramChannel {
//!     fn name(&self) -> &str { "telegram" }
//!     async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> { /* ... */ }
//!     async fn send_choice_prompt(&self, chat_id: i64, text: &str, choices: &[&str]) -> anyhow::Result<()> { /* ... */ }
//!     async fn send_audio(&self, chat_id: i64, file: &LocalFile) -> anyhow::Result<()> { /* ... */ }
//! }
//! ```

use tunegrab_media::LocalFile;

/// Outbound operations the bot needs from a chat platform.
///
/// Use `&self` for all methods; implementations are shared across
/// concurrently running jobs.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport identifier for logs (e.g. "telegram").
    fn name(&self) -> &str;

    /// Send a plain text reply.
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;

    /// Send `text` with one reply button per choice.
    async fn send_choice_prompt(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[&str],
    ) -> anyhow::Result<()>;

    /// Upload an audio file under `file.file_name`.
    async fn send_audio(&self, chat_id: i64, file: &LocalFile) -> anyhow::Result<()>;
}
