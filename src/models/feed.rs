//! Per-show feed documents and the snapshot that publishes them.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One assembled per-show feed document.
///
/// Immutable once built; clones share the document bytes.
#[derive(Debug, Clone)]
pub struct ShowFeed {
    /// Registry key and file name stem
    pub slug: String,

    /// Display name substituted into the channel header
    pub title: String,

    /// Channel `<pubDate>`, or assembly time when it could not be parsed
    pub pub_date: DateTime<Utc>,

    /// Quoted content hash for conditional requests
    pub etag: String,

    /// Number of episode blocks in the document
    pub episode_count: usize,

    /// The complete XML document
    pub data: Bytes,
}

impl ShowFeed {
    /// Published file name, `<slug>.xml`.
    pub fn file_name(&self) -> String {
        format!("{}.xml", self.slug)
    }

    pub fn summary(&self) -> ShowSummary {
        ShowSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            episodes: self.episode_count,
            pub_date: self.pub_date,
        }
    }
}

/// Serializable overview of one show feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowSummary {
    pub slug: String,
    pub title: String,
    pub episodes: usize,
    pub pub_date: DateTime<Utc>,
}

/// Counters gathered while splitting one source document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitStats {
    /// Episode blocks found in the source
    pub episodes: usize,

    /// Distinct shows the episodes were grouped into
    pub shows: usize,

    /// Episodes whose title matched no rule; left out of every feed
    pub unclassified: usize,
}

/// Complete slug → feed mapping produced by one refresh cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    feeds: BTreeMap<String, ShowFeed>,
    pub refreshed_at: DateTime<Utc>,
    pub stats: SplitStats,
}

impl Snapshot {
    pub fn new(feeds: BTreeMap<String, ShowFeed>, stats: SplitStats) -> Self {
        Self {
            feeds,
            refreshed_at: Utc::now(),
            stats,
        }
    }

    pub fn get(&self, slug: &str) -> Option<&ShowFeed> {
        self.feeds.get(slug)
    }

    /// Slugs in ascending order.
    pub fn slugs(&self) -> Vec<String> {
        self.feeds.keys().cloned().collect()
    }

    /// Feeds in slug order.
    pub fn feeds(&self) -> impl Iterator<Item = &ShowFeed> {
        self.feeds.values()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
