//! Local filesystem storage implementation.
//!
//! Mirrors every published snapshot into a directory so the per-show feeds
//! can also be served by a static file server.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── bad-friends.xml
//! ├── brad-abbey-live.xml
//! └── y-chromes.xml
//! ```
//!
//! Files are written atomically (temp file, then rename), and `.xml` files
//! whose show disappeared from the source feed are removed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{ShowFeed, Snapshot};
use crate::storage::{FeedStorage, WriteSummary};

const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    max_concurrent: usize,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        let tmp = path.with_extension("tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Remove `.xml` files whose stem is not in `keep`.
    async fn prune(&self, keep: &HashSet<String>) -> Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("xml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if keep.contains(stem) {
                continue;
            }

            tokio::fs::remove_file(&path).await?;
            log::info!("Removed stale feed {}", path.display());
            removed += 1;
        }

        Ok(removed)
    }
}

#[async_trait]
impl FeedStorage for LocalStorage {
    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<WriteSummary> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        // Owned feeds keep the write futures free of borrows into the snapshot.
        let feeds: Vec<ShowFeed> = snapshot.feeds().cloned().collect();
        let written: Vec<String> = stream::iter(feeds)
            .map(|feed| async move {
                self.write_bytes(&feed.file_name(), &feed.data).await?;
                log::debug!("Wrote {} ({} bytes)", feed.file_name(), feed.data.len());
                Ok::<_, AppError>(feed.slug)
            })
            .buffer_unordered(self.max_concurrent.max(1))
            .try_collect()
            .await?;

        let keep: HashSet<String> = written.iter().cloned().collect();
        let removed = self.prune(&keep).await?;

        Ok(WriteSummary {
            written: written.len(),
            removed,
            location: self.root_dir.display().to_string(),
            timestamp: Utc::now(),
        })
    }

    async fn load_feed(&self, slug: &str) -> Result<Option<Bytes>> {
        Ok(self.read_bytes(&format!("{slug}.xml")).await?.map(Bytes::from))
    }
}
