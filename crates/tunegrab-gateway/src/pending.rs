//! Links waiting for the user's platform choice.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Per-user memory of the last submitted link.
pub trait PendingChoiceStore: Send + Sync {
    /// Remember `link` for `user_id`, replacing any earlier one.
    fn put(&self, user_id: i64, link: String);

    /// Remove and return the link for `user_id`. Read and delete happen
    /// atomically.
    fn take_and_clear(&self, user_id: i64) -> Option<String>;
}

/// Process-local store. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryPendingChoices {
    links: Mutex<HashMap<i64, String>>,
}

impl InMemoryPendingChoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a pending link.
    pub fn len(&self) -> usize {
        self.links.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PendingChoiceStore for InMemoryPendingChoices {
    fn put(&self, user_id: i64, link: String) {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, link);
    }

    fn take_and_clear(&self, user_id: i64) -> Option<String> {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id)
    }
}
