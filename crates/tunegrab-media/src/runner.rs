//! Download orchestrator: routes a link to the adapter for its platform.

use std::sync::Arc;

use tracing::{info, warn};

use tunegrab_types::Platform;

use crate::types::{AudioAdapter, DownloadError, LocalFile};

/// Routes download requests to the registered platform adapters.
pub struct DownloadRunner {
    adapters: Vec<Arc<dyn AudioAdapter>>,
}

impl DownloadRunner {
    /// Create a runner with the given adapters. The first adapter
    /// registered for a platform wins.
    pub fn new(adapters: Vec<Arc<dyn AudioAdapter>>) -> Self {
        Self { adapters }
    }

    /// Find the adapter serving `platform`.
    fn adapter_for(&self, platform: Platform) -> Option<&dyn AudioAdapter> {
        self.adapters
            .iter()
            .find(|a| a.platform() == platform)
            .map(|a| a.as_ref())
    }

    /// Platforms with a registered adapter.
    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.iter().map(|a| a.platform()).collect()
    }

    /// Resolve `link` with the adapter for `platform`.
    pub async fn run(&self, platform: Platform, link: &str) -> Result<LocalFile, DownloadError> {
        let adapter = self
            .adapter_for(platform)
            .ok_or_else(|| DownloadError::UnsupportedPlatform(platform.to_string()))?;

        info!(%platform, "Resolving link");
        match adapter.resolve(link).await {
            Ok(file) => Ok(file),
            Err(e) => {
                warn!(%platform, "Adapter failed: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct StubAdapter {
        platform: Platform,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl AudioAdapter for StubAdapter {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn resolve(&self, url: &str) -> Result<LocalFile, DownloadError> {
            if self.fail {
                return Err(DownloadError::ScrapeFailed);
            }
            Ok(LocalFile {
                path: PathBuf::from(format!("tmp/{url}.mp3")),
                file_name: format!("{}.mp3", self.platform),
                size: 1,
            })
        }
    }

    fn stub(platform: Platform, fail: bool) -> Arc<dyn AudioAdapter> {
        Arc::new(StubAdapter { platform, fail })
    }

    #[tokio::test]
    async fn test_routes_by_platform() {
        let runner = DownloadRunner::new(vec![
            stub(Platform::YouTube, false),
            stub(Platform::SoundCloud, false),
        ]);
        let file = runner.run(Platform::SoundCloud, "x").await.unwrap();
        assert_eq!(file.file_name, "SoundCloud.mp3");
        let file = runner.run(Platform::YouTube, "x").await.unwrap();
        assert_eq!(file.file_name, "YouTube.mp3");
    }

    #[tokio::test]
    async fn test_missing_adapter_is_unsupported() {
        let runner = DownloadRunner::new(vec![stub(Platform::YouTube, false)]);
        let err = runner.run(Platform::SoundCloud, "x").await.unwrap_err();
        assert!(matches!(err, DownloadError::UnsupportedPlatform(p) if p == "SoundCloud"));
    }

    #[tokio::test]
    async fn test_adapter_error_propagates() {
        let runner = DownloadRunner::new(vec![stub(Platform::SoundCloud, true)]);
        let err = runner.run(Platform::SoundCloud, "x").await.unwrap_err();
        assert!(matches!(err, DownloadError::ScrapeFailed));
    }

    #[test]
    fn test_platforms() {
        let runner = DownloadRunner::new(vec![stub(Platform::YouTube, false)]);
        assert_eq!(runner.platforms(), vec![Platform::YouTube]);
    }
}
