//! tunegrab-config: bot configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. `~/.tunegrab/config.json5` (or an explicit path)
//! 3. `.env` / process environment (`TELEGRAM_TOKEN`)
//!
//! ```json5
//! {
//!     telegram: { bot_token: "123456:ABC-DEF..." },
//!     downloads: {
//!         temp_dir: "tmp",
//!         transcoder: "ffmpeg",
//!         max_concurrent_downloads: 4,
//!     },
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("TELEGRAM_TOKEN not set")]
    MissingToken,
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Overridden by `TELEGRAM_TOKEN` when that is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Bot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_api_base(),
        }
    }
}

/// Download, conversion and upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Working directory for intermediate and final files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Largest body a SoundCloud download may have.
    #[serde(default = "default_size_cap")]
    pub max_download_bytes: u64,
    /// Largest file the chat transport accepts for upload.
    #[serde(default = "default_size_cap")]
    pub upload_limit_bytes: u64,
    /// Wall-clock budget for YouTube metadata + stream download.
    #[serde(default = "default_youtube_timeout")]
    pub youtube_timeout_secs: u64,
    /// Request timeout for scraping track pages.
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    /// Transcoder program (ffmpeg-compatible argument contract).
    #[serde(default = "default_transcoder")]
    pub transcoder: String,
    /// Cap on concurrently running download jobs. `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_downloads: Option<usize>,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_size_cap() -> u64 {
    50 * MIB
}

fn default_youtube_timeout() -> u64 {
    10 * 60
}

fn default_page_timeout() -> u64 {
    30
}

fn default_transcoder() -> String {
    "ffmpeg".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            max_download_bytes: default_size_cap(),
            upload_limit_bytes: default_size_cap(),
            youtube_timeout_secs: default_youtube_timeout(),
            page_timeout_secs: default_page_timeout(),
            transcoder: default_transcoder(),
            max_concurrent_downloads: None,
        }
    }
}

/// Top-level tunegrab configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuneGrabConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub downloads: DownloadConfig,
}

impl TuneGrabConfig {
    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary environment lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.telegram.bot_token = Some(token);
        }
    }

    /// The bot token, or `MissingToken` if neither the file nor the
    /// environment supplied a non-empty one.
    pub fn bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    /// Create the working temp directory. Idempotent.
    pub fn ensure_temp_dir(&self) -> Result<&Path, ConfigError> {
        std::fs::create_dir_all(&self.downloads.temp_dir)?;
        Ok(&self.downloads.temp_dir)
    }
}

/// Resolve the tunegrab config directory (~/.tunegrab/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".tunegrab"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.tunegrab/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from `path` (or the default location), then overlay
/// `.env` and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<TuneGrabConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => match config_file_path() {
            Ok(path) => load_config_from(&path)?,
            Err(ConfigError::NoDirFound) => TuneGrabConfig::default(),
            Err(e) => return Err(e),
        },
    };
    config.apply_env();
    Ok(config)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<TuneGrabConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(TuneGrabConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TuneGrabConfig = json5::from_str(&content)?;
    Ok(config)
}
