//! tunegrab-media: link classification, platform adapters, transcoding and
//! the download orchestrator.

pub mod download;
pub mod links;
pub mod runner;
pub mod soundcloud;
pub mod transcode;
pub mod types;
pub mod youtube;

pub use download::TempFileGuard;
pub use runner::DownloadRunner;
pub use types::{AudioAdapter, DownloadError, LocalFile};
