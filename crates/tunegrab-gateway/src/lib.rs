//! tunegrab-gateway: the per-user link → platform choice → download state
//! machine.
//!
//! ```text
//! ChatTransport (inbound ChatEvent via mpsc)
//!     ↓
//! Dispatcher ── classify ──▶ PendingChoiceStore::put ──▶ platform prompt
//!     │
//!     └─ platform choice ──▶ PendingChoiceStore::take_and_clear
//!                                ↓ (spawned per request)
//!                            DownloadRunner ──▶ DeliverySink ──▶ ChatTransport
//! ```

pub mod delivery;
pub mod dispatch;
pub mod job;
pub mod pending;
pub mod transport;

pub use delivery::{DeliveryError, DeliverySink};
pub use dispatch::{Dispatch, Dispatcher};
pub use job::{DownloadJob, JobError};
pub use pending::{InMemoryPendingChoices, PendingChoiceStore};
pub use transport::ChatTransport;

#[cfg(test)]
pub(crate) mod test_support;
