// src/pipeline/split.rs

//! Splitting one aggregated feed into per-show feeds.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Snapshot, SplitStats};
use crate::services::assembler::assemble;
use crate::services::{TitleClassifier, scanner};
use crate::utils::slug::slugify;

/// Episodes grouped under one slug.
struct ShowGroup<'a> {
    /// Display name of the first episode seen for the slug
    show: String,
    items: Vec<&'a [u8]>,
}

/// Split `data` into a snapshot with one feed per show.
///
/// Episodes keep their source order within each show. Episodes whose title
/// matches no rule are left out of every feed and counted in the returned
/// snapshot's stats. Shows whose names normalize to the same slug share one
/// feed under the first name seen.
pub fn split_feed(data: &[u8], classifier: &TitleClassifier) -> Result<Snapshot> {
    let parsed = scanner::parse(data)?;

    let mut stats = SplitStats {
        episodes: parsed.episodes.len(),
        ..SplitStats::default()
    };
    let mut groups: BTreeMap<String, ShowGroup<'_>> = BTreeMap::new();

    for episode in &parsed.episodes {
        let raw_title = episode.title_text();
        let Some(show) = classifier.classify_raw(&raw_title) else {
            log::debug!("Unclassified episode: {raw_title:?}");
            stats.unclassified += 1;
            continue;
        };

        let slug = slugify(&show);
        match groups.get_mut(&slug) {
            Some(group) => {
                if group.show != show {
                    log::debug!("Merging {show:?} into {:?} ({slug})", group.show);
                }
                group.items.push(episode.block);
            }
            None => {
                groups.insert(
                    slug,
                    ShowGroup {
                        show,
                        items: vec![episode.block],
                    },
                );
            }
        }
    }

    stats.shows = groups.len();

    let mut feeds = BTreeMap::new();
    for (slug, group) in groups {
        let feed = assemble(&group.show, &slug, parsed.prelude, &group.items, parsed.postlude)?;
        log::debug!(
            "Found show={:?} sys={} episodes={}",
            group.show,
            slug,
            feed.episode_count
        );
        feeds.insert(slug, feed);
    }

    if stats.unclassified > 0 {
        log::warn!(
            "{} of {} episodes matched no show and were left out",
            stats.unclassified,
            stats.episodes
        );
    }

    Ok(Snapshot::new(feeds, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::editor::{apply_edits, plan_edits};

    const FEED: &[u8] = include_bytes!("../../testdata/feed.xml");

    fn classifier() -> &'static TitleClassifier {
        TitleClassifier::builtin()
    }

    #[test]
    fn test_split_two_shows() {
        let doc = b"<rss><channel><title>Network</title><itunes:name>Network</itunes:name>\
<image><title>Network</title></image>\n<item><title>Bad Friends Ep. 1: Pilot</title></item>\
\n<item><title>MAHA News Ep. 2 - Soda</title></item>\n</channel></rss>";

        let snapshot = split_feed(doc, classifier()).unwrap();
        assert_eq!(snapshot.slugs(), vec!["bad-friends", "maha-news"]);

        let bad_friends = std::str::from_utf8(&snapshot.get("bad-friends").unwrap().data).unwrap();
        assert_eq!(
            bad_friends,
            "<rss><channel><title>Bad Friends</title><itunes:name>Bad Friends</itunes:name>\
<image><title>Network</title></image>\n<item><title>Bad Friends Ep. 1: Pilot</title></item>\
\n</channel></rss>"
        );

        let maha = std::str::from_utf8(&snapshot.get("maha-news").unwrap().data).unwrap();
        assert!(maha.contains("<title>MAHA News</title>"));
        assert!(maha.contains("<item><title>MAHA News Ep. 2 - Soda</title></item>"));
        assert!(!maha.contains("Bad Friends"));
    }

    #[test]
    fn test_split_fixture() {
        let snapshot = split_feed(FEED, classifier()).unwrap();

        assert_eq!(snapshot.slugs(), vec!["bad-friends", "brad-abbey-live", "y-chromes"]);
        assert_eq!(
            snapshot.stats,
            SplitStats {
                episodes: 6,
                shows: 3,
                unclassified: 1,
            }
        );

        let brad = snapshot.get("brad-abbey-live").unwrap();
        assert_eq!(brad.title, "Brad & Abbey Live");
        let text = std::str::from_utf8(&brad.data).unwrap();
        assert!(text.contains("<itunes:name>Brad &amp; Abbey Live</itunes:name>"));
        assert!(text.contains("<itunes:block>Yes</itunes:block>"));

        let y_chromes = snapshot.get("y-chromes").unwrap();
        assert_eq!(y_chromes.title, "Y-Chromes");
        assert_eq!(y_chromes.episode_count, 2);
    }

    #[test]
    fn test_split_feed_is_byte_exact() {
        let snapshot = split_feed(FEED, classifier()).unwrap();
        let parsed = scanner::parse(FEED).unwrap();

        let prelude = apply_edits(parsed.prelude, plan_edits(parsed.prelude, "Bad Friends")).unwrap();
        let mut want = prelude.to_vec();
        want.extend_from_slice(parsed.episodes[0].block);
        want.extend_from_slice(parsed.episodes[3].block);
        want.extend_from_slice(parsed.postlude);

        assert_eq!(snapshot.get("bad-friends").unwrap().data, want);
    }

    #[test]
    fn test_split_partitions_episodes() {
        let snapshot = split_feed(FEED, classifier()).unwrap();
        let assigned: usize = snapshot.feeds().map(|f| f.episode_count).sum();
        assert_eq!(assigned + snapshot.stats.unclassified, snapshot.stats.episodes);
        assert!(snapshot.feeds().all(|f| !f.data.windows(20).any(|w| w == b"Special Announcement")));
    }

    #[test]
    fn test_split_corrupt_feed() {
        let err = split_feed(b"<rss><channel></channel></rss>", classifier()).unwrap_err();
        assert!(matches!(err, AppError::CorruptFeed(_)));
    }

    #[test]
    fn test_split_only_unclassified() {
        let doc = b"<rss>\n<item><title>Special Announcement</title></item>\n</rss>";
        let snapshot = split_feed(doc, classifier()).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.stats.unclassified, 1);
    }
}
