//! One accepted download request: resolve, deliver, report.

use thiserror::Error;
use tracing::{info, warn};

use tunegrab_media::{DownloadError, DownloadRunner};
use tunegrab_types::Platform;

use crate::delivery::{DeliveryError, DeliverySink};
use crate::transport::ChatTransport;

/// Prefix of every user-visible failure message.
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// A link the user asked to fetch from `platform`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub chat_id: i64,
    pub user_id: i64,
    pub platform: Platform,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// The chat text shown for a failed job.
pub fn error_message(err: &JobError) -> String {
    format!("{ERROR_PREFIX}{err}")
}

/// Resolve and deliver without reporting.
pub async fn execute(
    runner: &DownloadRunner,
    sink: &DeliverySink,
    job: &DownloadJob,
) -> Result<(), JobError> {
    let file = runner.run(job.platform, &job.link).await?;
    sink.deliver(job.chat_id, file).await?;
    Ok(())
}

/// Run `job` to completion. Failures become a single chat message; a
/// failure to send that message is only logged.
pub async fn run_job(
    runner: &DownloadRunner,
    sink: &DeliverySink,
    transport: &dyn ChatTransport,
    job: DownloadJob,
) {
    match execute(runner, sink, &job).await {
        Ok(()) => info!(
            chat_id = job.chat_id,
            user_id = job.user_id,
            platform = %job.platform,
            "Job finished"
        ),
        Err(e) => {
            warn!(
                chat_id = job.chat_id,
                user_id = job.user_id,
                platform = %job.platform,
                "Job failed: {e}"
            );
            if let Err(send_err) = transport.send_text(job.chat_id, &error_message(&e)).await {
                warn!(chat_id = job.chat_id, "Failed to send error message: {send_err:#}");
            }
        }
    }
}
