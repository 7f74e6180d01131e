use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tunegrab_channel_telegram::TelegramChannel;
use tunegrab_channel_telegram::api::TelegramApi;
use tunegrab_config::TuneGrabConfig;
use tunegrab_gateway::{DeliverySink, Dispatcher, InMemoryPendingChoices};
use tunegrab_media::soundcloud::SoundCloudAdapter;
use tunegrab_media::transcode::Transcoder;
use tunegrab_media::youtube::YouTubeAdapter;
use tunegrab_media::{AudioAdapter, DownloadRunner};

const INBOUND_BUFFER: usize = 256;

/// Wire the bot together and run it until Ctrl-C.
pub async fn run_bot(config: TuneGrabConfig) -> anyhow::Result<()> {
    let token = config.bot_token()?;
    let temp_dir = config
        .ensure_temp_dir()
        .context("failed to create temp directory")?
        .to_path_buf();
    let downloads = &config.downloads;

    let transcoder = Transcoder::new(downloads.transcoder.clone());
    let adapters: Vec<Arc<dyn AudioAdapter>> = vec![
        Arc::new(YouTubeAdapter::new(
            temp_dir.clone(),
            Duration::from_secs(downloads.youtube_timeout_secs),
            transcoder,
        )),
        Arc::new(SoundCloudAdapter::new(
            temp_dir.clone(),
            Duration::from_secs(downloads.page_timeout_secs),
            downloads.max_download_bytes,
        )),
    ];
    let runner = Arc::new(DownloadRunner::new(adapters));
    info!(platforms = ?runner.platforms(), "Download adapters registered");

    let api = TelegramApi::with_api_base(&config.telegram.api_base, token)?;
    let channel = Arc::new(TelegramChannel::new(api));
    let sink = Arc::new(DeliverySink::new(
        channel.clone(),
        downloads.upload_limit_bytes,
    ));
    let store = Arc::new(InMemoryPendingChoices::new());

    let dispatcher = Dispatcher::new(channel.clone(), store, runner, sink)
        .with_max_concurrent(downloads.max_concurrent_downloads);

    let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
    channel.start(tx).await?;
    info!(temp_dir = %temp_dir.display(), "tunegrab is running");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            on_signal.cancel();
        }
    });

    dispatcher.run(rx, cancel).await;
    channel.stop().await?;
    Ok(())
}
