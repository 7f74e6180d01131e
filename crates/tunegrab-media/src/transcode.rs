//! External MP3 transcoder invocation.
//!
//! Contract: `<program> -i <input> -codec:a libmp3lame -q:a 0 <output>`,
//! exit code 0 on success. Any tool accepting that shape will do.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::types::DownloadError;

/// Characters of stderr carried into a `ConversionFailed` error.
const STDERR_TAIL_CHARS: usize = 300;

/// Runs an ffmpeg-compatible program.
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument vector for converting `input` to best-quality MP3 at `output`.
    pub fn mp3_args(input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-i".into(),
            input.as_os_str().to_owned(),
            "-codec:a".into(),
            "libmp3lame".into(),
            "-q:a".into(),
            "0".into(),
            output.as_os_str().to_owned(),
        ]
    }

    /// Convert `input` to MP3 at `output`.
    pub async fn to_mp3(&self, input: &Path, output: &Path) -> Result<(), DownloadError> {
        debug!(
            program = %self.program,
            input = %input.display(),
            output = %output.display(),
            "Running transcoder"
        );

        let result = Command::new(&self.program)
            .args(Self::mp3_args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DownloadError::ConversionFailed(format!("failed to run {}: {e}", self.program))
            })?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let tail = stderr_tail(&stderr);
        warn!(program = %self.program, status = %result.status, "Transcoder failed: {tail}");
        Err(DownloadError::ConversionFailed(if tail.is_empty() {
            result.status.to_string()
        } else {
            format!("{}: {tail}", result.status)
        }))
    }

    /// Check the program is runnable; returns the first line of `-version`.
    pub async fn probe(&self) -> Result<String, DownloadError> {
        let result = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                DownloadError::ConversionFailed(format!("failed to run {}: {e}", self.program))
            })?;

        if !result.status.success() {
            return Err(DownloadError::ConversionFailed(format!(
                "{} -version exited with {}",
                self.program, result.status
            )));
        }

        Ok(String::from_utf8_lossy(&result.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    trimmed
        .chars()
        .skip(count.saturating_sub(STDERR_TAIL_CHARS))
        .collect()
}
