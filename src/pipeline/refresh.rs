// src/pipeline/refresh.rs

//! Periodic refresh of the published snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::error::Result;
use crate::models::{Config, SplitStats};
use crate::services::TitleClassifier;
use crate::storage::{FeedRegistry, FeedStorage};
use crate::utils::http::{create_client, fetch_feed};

use super::split::split_feed;

/// Fetches the source feed, splits it and publishes the result.
///
/// A failed cycle leaves the previously published snapshot in place.
pub struct Refresher {
    feed_url: String,
    timeout_secs: u64,
    interval: Duration,
    client: reqwest::Client,
    classifier: TitleClassifier,
    registry: Arc<FeedRegistry>,
    mirror: Option<Arc<dyn FeedStorage>>,
    /// Serializes cycles so a slow fetch never overlaps the next one
    cycle: Mutex<()>,
}

impl Refresher {
    pub fn new(config: &Config, registry: Arc<FeedRegistry>) -> Result<Self> {
        Ok(Self {
            feed_url: config.source.url.clone(),
            timeout_secs: config.source.timeout_secs,
            interval: Duration::from_secs(config.refresh.interval_secs),
            client: create_client(&config.source)?,
            classifier: TitleClassifier::from_rules(&config.shows)?,
            registry,
            mirror: None,
            cycle: Mutex::new(()),
        })
    }

    /// Also write every published snapshot to `storage`.
    pub fn with_mirror(mut self, storage: Arc<dyn FeedStorage>) -> Self {
        self.mirror = Some(storage);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn registry(&self) -> &Arc<FeedRegistry> {
        &self.registry
    }

    /// Run one fetch → split → publish cycle.
    pub async fn refresh_once(&self) -> Result<SplitStats> {
        let _cycle = self.cycle.lock().await;
        let started = Utc::now();

        log::debug!("Fetching {}", self.feed_url);
        let data = fetch_feed(&self.client, &self.feed_url, self.timeout_secs).await?;
        let snapshot = Arc::new(split_feed(&data, &self.classifier)?);
        let stats = snapshot.stats;

        self.registry.replace(Arc::clone(&snapshot));

        let elapsed = (Utc::now() - started).num_milliseconds();
        log::info!(
            "Published {} shows from {} episodes ({} bytes, {} ms)",
            stats.shows,
            stats.episodes,
            data.len(),
            elapsed
        );

        // The registry is already updated; a mirror failure only costs the copy on disk.
        if let Some(mirror) = &self.mirror {
            match mirror.write_snapshot(&snapshot).await {
                Ok(summary) => log::info!(
                    "Mirrored {} feeds to {} ({} stale removed)",
                    summary.written,
                    summary.location,
                    summary.removed
                ),
                Err(e) => log::warn!("Failed to mirror feeds: {e}"),
            }
        }

        Ok(stats)
    }

    /// Refresh until the first success, then once per interval, forever.
    ///
    /// Both phases wait one interval between attempts. Errors are logged and
    /// never end the loop.
    pub async fn run(&self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            match self.refresh_once().await {
                Ok(_) => break,
                Err(e) => log::error!("Refresh failed (feed={}, first=true): {e}", self.feed_url),
            }
            ticker.tick().await;
        }

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_once().await {
                log::error!("Refresh failed (feed={}, first=false): {e}", self.feed_url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;
    use url::Url;

    use super::*;
    use crate::error::AppError;
    use crate::storage::LocalStorage;

    const FEED: &[u8] = include_bytes!("../../testdata/feed.xml");

    fn refresher(path: &Path, registry: Arc<FeedRegistry>) -> Refresher {
        let mut config = Config::default();
        config.source.url = Url::from_file_path(path).unwrap().to_string();
        Refresher::new(&config, registry).unwrap()
    }

    /// Replace `path` in one step so a concurrent refresh never reads half a file.
    fn replace_file(path: &Path, data: &[u8]) {
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data).unwrap();
        std::fs::rename(&tmp, path).unwrap();
    }

    async fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, FEED).unwrap();

        let registry = Arc::new(FeedRegistry::new());
        let stats = refresher(&path, registry.clone()).refresh_once().await.unwrap();

        assert_eq!(stats.shows, 3);
        assert_eq!(stats.unclassified, 1);
        assert_eq!(registry.list_slugs(), vec!["bad-friends", "brad-abbey-live", "y-chromes"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, FEED).unwrap();

        let registry = Arc::new(FeedRegistry::new());
        let refresher = refresher(&path, registry.clone());
        refresher.refresh_once().await.unwrap();
        let before = registry.snapshot().unwrap();

        std::fs::write(&path, b"<rss><channel></channel></rss>").unwrap();
        let err = refresher.refresh_once().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptFeed(_)));

        std::fs::remove_file(&path).unwrap();
        assert!(refresher.refresh_once().await.is_err());

        let after = registry.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_refresh_writes_mirror() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, FEED).unwrap();
        let out = dir.path().join("out");

        let storage = Arc::new(LocalStorage::new(&out));
        let refresher =
            refresher(&path, Arc::new(FeedRegistry::new())).with_mirror(storage.clone());
        refresher.refresh_once().await.unwrap();

        let data = storage.load_feed("y-chromes").await.unwrap().unwrap();
        assert!(data.starts_with(b"<?xml"));
        assert!(out.join("bad-friends.xml").exists());
    }

    #[tokio::test]
    async fn test_run_retries_until_first_success() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.xml");

        let registry = Arc::new(FeedRegistry::new());
        let refresher = Arc::new(
            refresher(&path, registry.clone()).with_interval(Duration::from_millis(20)),
        );
        let task = tokio::spawn({
            let refresher = refresher.clone();
            async move { refresher.run().await }
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!registry.is_ready());

        replace_file(&path, FEED);
        let ready = wait_for(|| registry.is_ready()).await;
        task.abort();

        assert!(ready);
        assert!(registry.is_ready());
        assert_eq!(registry.list_slugs().len(), 3);
    }

    #[tokio::test]
    async fn test_run_keeps_snapshot_through_later_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.xml");
        replace_file(&path, FEED);

        let registry = Arc::new(FeedRegistry::new());
        let refresher = Arc::new(
            refresher(&path, registry.clone()).with_interval(Duration::from_millis(20)),
        );
        let task = tokio::spawn({
            let refresher = refresher.clone();
            async move { refresher.run().await }
        });

        assert!(wait_for(|| registry.is_ready()).await);
        let published = registry.snapshot().unwrap();

        replace_file(&path, b"<rss><channel></channel></rss>");
        // A cycle that read the good file before the swap may still publish.
        tokio::time::sleep(Duration::from_millis(40)).await;
        let before_failures = registry.snapshot().unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let after_failures = registry.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before_failures, &after_failures));
        assert_eq!(after_failures.slugs(), published.slugs());

        replace_file(&path, FEED);
        let refreshed = wait_for(|| {
            let current = registry.snapshot().unwrap();
            !Arc::ptr_eq(&current, &after_failures)
        })
        .await;
        task.abort();

        assert!(refreshed);
        assert_eq!(registry.list_slugs().len(), 3);
    }
}
