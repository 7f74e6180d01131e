//! Inbound event loop.
//!
//! Events are handled one at a time: classification, store updates and
//! prompt replies all happen on this path. Each accepted platform choice
//! spawns an independent job that reports back only through the chat.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use tunegrab_media::DownloadRunner;
use tunegrab_media::links::classify;
use tunegrab_types::{ChatEvent, Platform};

use crate::delivery::DeliverySink;
use crate::job::{DownloadJob, run_job};
use crate::pending::PendingChoiceStore;
use crate::transport::ChatTransport;

pub const GREETING: &str =
    "Hi! Send me a link to a track on YouTube or SoundCloud and I'll download it for you.";
pub const CHOOSE_PLATFORM: &str = "Choose the platform to download from:";
pub const LINK_FIRST: &str = "Send me a track link first.";
pub const SEND_LINK: &str = "Send me a YouTube or SoundCloud track link.";
pub const DOWNLOADING: &str = "⏳ Downloading, this may take a while...";

/// What the dispatcher did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// `/start` answered.
    Greeted,
    /// Nothing to do (empty text).
    Ignored,
    /// Link stored, platform prompt sent.
    Prompted(Platform),
    /// Pending link taken, download job spawned.
    Spawned(Platform),
    /// Platform chosen without a pending link.
    NoPendingLink,
    /// Neither a link nor a platform choice.
    Unrecognized,
}

/// Routes chat events through the link → choice → download state machine.
pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn PendingChoiceStore>,
    runner: Arc<DownloadRunner>,
    sink: Arc<DeliverySink>,
    limiter: Option<Arc<Semaphore>>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn PendingChoiceStore>,
        runner: Arc<DownloadRunner>,
        sink: Arc<DeliverySink>,
    ) -> Self {
        Self {
            transport,
            store,
            runner,
            sink,
            limiter: None,
            tracker: TaskTracker::new(),
        }
    }

    /// Cap concurrently running jobs. `None` (or zero) leaves them unbounded.
    pub fn with_max_concurrent(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Tracker owning every spawned job.
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Consume events until `inbound` closes or `cancel` fires. Jobs still
    /// running at that point are left alone.
    pub async fn run(&self, mut inbound: mpsc::Receiver<ChatEvent>, cancel: CancellationToken) {
        info!(transport = self.transport.name(), "Dispatch loop started");

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = inbound.recv() => event,
            };
            let Some(event) = event else {
                info!("Inbound channel closed");
                break;
            };
            self.handle_event(event).await;
        }

        self.tracker.close();
        info!(in_flight = self.tracker.len(), "Dispatch loop stopped");
    }

    /// Handle a single event.
    pub async fn handle_event(&self, event: ChatEvent) -> Dispatch {
        let ChatEvent {
            user_id,
            chat_id,
            text,
            command,
        } = event;

        if command.as_deref() == Some("start") {
            self.reply(chat_id, GREETING).await;
            return Dispatch::Greeted;
        }

        if text.is_empty() {
            return Dispatch::Ignored;
        }

        if let Some(platform) = classify(&text) {
            debug!(user_id, chat_id, %platform, "Link received");
            self.store.put(user_id, text);
            let choices = Platform::ALL.map(Platform::label);
            if let Err(e) = self
                .transport
                .send_choice_prompt(chat_id, CHOOSE_PLATFORM, &choices)
                .await
            {
                warn!(chat_id, "Failed to send platform prompt: {e:#}");
            }
            return Dispatch::Prompted(platform);
        }

        if let Some(platform) = Platform::from_choice(&text) {
            let Some(link) = self.store.take_and_clear(user_id) else {
                self.reply(chat_id, LINK_FIRST).await;
                return Dispatch::NoPendingLink;
            };

            self.reply(chat_id, DOWNLOADING).await;
            self.spawn_job(DownloadJob {
                chat_id,
                user_id,
                platform,
                link,
            });
            return Dispatch::Spawned(platform);
        }

        self.reply(chat_id, SEND_LINK).await;
        Dispatch::Unrecognized
    }

    fn spawn_job(&self, job: DownloadJob) {
        info!(
            chat_id = job.chat_id,
            user_id = job.user_id,
            platform = %job.platform,
            "Spawning download job"
        );

        let runner = self.runner.clone();
        let sink = self.sink.clone();
        let transport = self.transport.clone();
        let limiter = self.limiter.clone();

        self.tracker.spawn(async move {
            let _permit = match limiter {
                Some(sem) => match sem.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };
            run_job(&runner, &sink, transport.as_ref(), job).await;
        });
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            warn!(chat_id, "Failed to send reply: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tunegrab_media::{AudioAdapter, DownloadError};

    use crate::pending::InMemoryPendingChoices;
    use crate::test_support::{FakeAdapter, RecordingTransport, Sent};

    struct Harness {
        dir: tempfile::TempDir,
        transport: Arc<RecordingTransport>,
        store: Arc<InMemoryPendingChoices>,
        dispatcher: Dispatcher,
    }

    fn harness(fail_with: Option<fn() -> DownloadError>, limit: Option<usize>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let store = Arc::new(InMemoryPendingChoices::new());
        let adapters: Vec<Arc<dyn AudioAdapter>> = Platform::ALL
            .into_iter()
            .map(|platform| {
                Arc::new(FakeAdapter {
                    platform,
                    dir: dir.path().to_path_buf(),
                    fail_with,
                }) as Arc<dyn AudioAdapter>
            })
            .collect();
        let runner = Arc::new(DownloadRunner::new(adapters));
        let sink = Arc::new(DeliverySink::new(transport.clone(), 1024 * 1024));
        let dispatcher = Dispatcher::new(transport.clone(), store.clone(), runner, sink)
            .with_max_concurrent(limit);
        Harness {
            dir,
            transport,
            store,
            dispatcher,
        }
    }

    fn text(user_id: i64, text: &str) -> ChatEvent {
        ChatEvent {
            user_id,
            chat_id: user_id * 10,
            text: text.into(),
            command: None,
        }
    }

    async fn wait_for_jobs(dispatcher: &Dispatcher) {
        dispatcher.tracker().close();
        tokio::time::timeout(Duration::from_secs(5), dispatcher.tracker().wait())
            .await
            .expect("jobs should finish");
    }

    #[tokio::test]
    async fn test_start_command_greets() {
        let h = harness(None, None);
        let event = ChatEvent {
            command: Some("start".into()),
            ..text(1, "/start")
        };
        assert_eq!(h.dispatcher.handle_event(event).await, Dispatch::Greeted);
        assert_eq!(h.transport.texts().await, vec![GREETING.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_text_ignored() {
        let h = harness(None, None);
        assert_eq!(h.dispatcher.handle_event(text(1, "")).await, Dispatch::Ignored);
        assert!(h.transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_link_then_choice_delivers_file() {
        let h = harness(None, None);

        let link = "check this https://youtu.be/dQw4w9WgXcQ";
        assert_eq!(
            h.dispatcher.handle_event(text(42, link)).await,
            Dispatch::Prompted(Platform::YouTube)
        );
        assert_eq!(
            h.dispatcher.handle_event(text(42, "YouTube")).await,
            Dispatch::Spawned(Platform::YouTube)
        );
        assert!(h.store.is_empty());

        wait_for_jobs(&h.dispatcher).await;

        let sent = h.transport.sent().await;
        assert_eq!(
            sent,
            vec![
                Sent::Prompt {
                    chat_id: 420,
                    text: CHOOSE_PLATFORM.into(),
                    choices: vec!["YouTube".into(), "SoundCloud".into()],
                },
                Sent::Text {
                    chat_id: 420,
                    text: DOWNLOADING.into(),
                },
                Sent::Audio {
                    chat_id: 420,
                    file_name: "Track.mp3".into(),
                    bytes: format!("audio for {link}").into_bytes(),
                },
            ]
        );
        // temp file removed after delivery
        assert!(std::fs::read_dir(h.dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_choice_without_link_spawns_nothing() {
        let h = harness(None, None);
        assert_eq!(
            h.dispatcher.handle_event(text(42, "YouTube")).await,
            Dispatch::NoPendingLink
        );
        assert!(h.dispatcher.tracker().is_empty());
        assert_eq!(h.transport.texts().await, vec![LINK_FIRST.to_string()]);
    }

    #[tokio::test]
    async fn test_second_choice_needs_new_link() {
        let h = harness(None, None);
        h.dispatcher
            .handle_event(text(1, "https://soundcloud.com/a/b"))
            .await;
        h.dispatcher.handle_event(text(1, "SoundCloud")).await;
        assert_eq!(
            h.dispatcher.handle_event(text(1, "SoundCloud")).await,
            Dispatch::NoPendingLink
        );
        wait_for_jobs(&h.dispatcher).await;
    }

    #[tokio::test]
    async fn test_choice_is_case_sensitive() {
        let h = harness(None, None);
        h.dispatcher
            .handle_event(text(1, "https://soundcloud.com/a/b"))
            .await;
        assert_eq!(
            h.dispatcher.handle_event(text(1, "soundcloud")).await,
            Dispatch::Unrecognized
        );
        // link still pending
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_text_gets_hint() {
        let h = harness(None, None);
        assert_eq!(
            h.dispatcher.handle_event(text(1, "hello")).await,
            Dispatch::Unrecognized
        );
        assert_eq!(h.transport.texts().await, vec![SEND_LINK.to_string()]);
    }

    #[tokio::test]
    async fn test_users_do_not_share_links() {
        let h = harness(None, None);
        h.dispatcher
            .handle_event(text(1, "https://soundcloud.com/a/b"))
            .await;
        assert_eq!(
            h.dispatcher.handle_event(text(2, "SoundCloud")).await,
            Dispatch::NoPendingLink
        );
    }

    #[tokio::test]
    async fn test_job_failure_becomes_error_message() {
        let h = harness(Some(|| DownloadError::NoAudioStream), None);
        h.dispatcher
            .handle_event(text(3, "https://youtu.be/dQw4w9WgXcQ"))
            .await;
        h.dispatcher.handle_event(text(3, "YouTube")).await;
        wait_for_jobs(&h.dispatcher).await;

        let texts = h.transport.texts().await;
        assert_eq!(texts.last().unwrap(), "❌ Error: no audio stream found");
    }

    #[tokio::test]
    async fn test_limited_concurrency_still_completes() {
        let h = harness(None, Some(1));
        for user in 1..=3 {
            h.dispatcher
                .handle_event(text(user, "https://soundcloud.com/a/b"))
                .await;
            h.dispatcher.handle_event(text(user, "SoundCloud")).await;
        }
        wait_for_jobs(&h.dispatcher).await;

        let uploads = h
            .transport
            .sent()
            .await
            .into_iter()
            .filter(|s| matches!(s, Sent::Audio { .. }))
            .count();
        assert_eq!(uploads, 3);
    }

    #[tokio::test]
    async fn test_run_exits_when_inbound_closes() {
        let h = harness(None, None);
        let (tx, rx) = mpsc::channel(8);
        tx.send(text(1, "hello")).await.unwrap();
        drop(tx);

        tokio::time::timeout(
            Duration::from_secs(2),
            h.dispatcher.run(rx, CancellationToken::new()),
        )
        .await
        .expect("loop should exit when the channel closes");
        assert_eq!(h.transport.texts().await, vec![SEND_LINK.to_string()]);
    }

    #[tokio::test]
    async fn test_run_exits_on_cancel() {
        let h = harness(None, None);
        let (_tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), h.dispatcher.run(rx, cancel))
            .await
            .expect("loop should exit promptly on cancel");
    }
}
