//! In-memory registry of the currently published snapshot.
//!
//! Readers clone the `Arc` under a read lock and work on the snapshot after
//! releasing it; the writer builds the next snapshot elsewhere and only takes
//! the write lock to swap the pointer. Nobody ever sees a half-built mapping.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{ShowFeed, Snapshot};

/// Holds the current slug → feed snapshot.
#[derive(Debug, Default)]
pub struct FeedRegistry {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `snapshot`, returning the one it replaced.
    pub fn replace(&self, snapshot: impl Into<Arc<Snapshot>>) -> Option<Arc<Snapshot>> {
        let next = snapshot.into();
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.replace(next)
    }

    /// The current snapshot, if one was ever published.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lookup(&self, slug: &str) -> Option<ShowFeed> {
        self.snapshot()?.get(slug).cloned()
    }

    /// Slugs of the current snapshot, sorted; empty before the first publish.
    pub fn list_slugs(&self) -> Vec<String> {
        self.snapshot().map(|s| s.slugs()).unwrap_or_default()
    }

    /// Whether a snapshot has been published.
    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }
}
