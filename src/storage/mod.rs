//! Storage for assembled per-show feeds.
//!
//! - [`FeedRegistry`]: the in-memory snapshot readers are served from
//! - [`LocalStorage`]: optional on-disk mirror, one `<slug>.xml` per show

pub mod local;
pub mod registry;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;
pub use registry::FeedRegistry;

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Number of feed documents written
    pub written: usize,
    /// Number of stale feed documents removed
    pub removed: usize,
    /// Human-readable location of the written feeds
    pub location: String,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for persistent feed storage backends.
#[async_trait]
pub trait FeedStorage: Send + Sync {
    /// Persist every feed in `snapshot`, dropping feeds it no longer has.
    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<WriteSummary>;

    /// Load one stored feed document by slug.
    async fn load_feed(&self, slug: &str) -> Result<Option<Bytes>>;
}
