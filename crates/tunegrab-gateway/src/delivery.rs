//! Final-mile upload of produced files.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use tunegrab_media::{LocalFile, TempFileGuard};

use crate::transport::ChatTransport;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("file is too large to upload ({:.2}MB)", megabytes(.size))]
    TooLargeForTransport { size: u64 },
    #[error("upload failed: {0}")]
    DeliveryFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn megabytes(size: &u64) -> f64 {
    *size as f64 / 1024.0 / 1024.0
}

/// Uploads files through a [`ChatTransport`] and always removes them
/// afterwards.
pub struct DeliverySink {
    transport: Arc<dyn ChatTransport>,
    upload_limit: u64,
}

impl DeliverySink {
    pub fn new(transport: Arc<dyn ChatTransport>, upload_limit: u64) -> Self {
        Self {
            transport,
            upload_limit,
        }
    }

    /// Upload `file` to `chat_id`. The file is deleted on every path.
    pub async fn deliver(&self, chat_id: i64, file: LocalFile) -> Result<(), DeliveryError> {
        let guard = TempFileGuard::new(&file.path);

        let size = tokio::fs::metadata(guard.path()).await?.len();
        if size > self.upload_limit {
            return Err(DeliveryError::TooLargeForTransport { size });
        }

        self.transport
            .send_audio(chat_id, &file)
            .await
            .map_err(|e| DeliveryError::DeliveryFailed(format!("{e:#}")))?;

        info!(
            chat_id,
            transport = self.transport.name(),
            file = %file.file_name,
            size,
            "Delivered audio"
        );
        Ok(())
    }
}
