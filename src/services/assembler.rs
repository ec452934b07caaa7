// src/services/assembler.rs

//! Per-show feed assembly.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::ShowFeed;
use crate::services::editor::{apply_edits, plan_edits};
use crate::utils::find_element;

const PUB_DATE_OPEN: &[u8] = b"<pubDate>";
const PUB_DATE_CLOSE: &[u8] = b"</pubDate>";

/// RFC 1123 with a numeric zone, e.g. `Wed, 02 Apr 2025 01:31:02 -0400`,
/// after the leading weekday has been split off.
const PUB_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// Concatenate header, episode blocks and trailer into one document.
pub fn concat_feed(prelude: &[u8], items: &[&[u8]], postlude: &[u8]) -> Vec<u8> {
    let size = prelude.len() + postlude.len() + items.iter().map(|i| i.len()).sum::<usize>();

    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(prelude);
    for item in items {
        buf.extend_from_slice(item);
    }
    buf.extend_from_slice(postlude);
    buf
}

/// Parse the header's `<pubDate>`.
///
/// The weekday must be a three-letter name but is not checked against the
/// date; feeds with a wrong weekday still get their stated date.
pub fn parse_pub_date(prelude: &[u8]) -> Option<DateTime<Utc>> {
    let range = find_element(prelude, PUB_DATE_OPEN, PUB_DATE_CLOSE)?;
    let text = std::str::from_utf8(&prelude[range]).ok()?;
    let (weekday, date) = text.split_once(", ")?;
    if weekday.len() != 3 || !weekday.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    DateTime::parse_from_str(date, PUB_DATE_FORMAT)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// The header's `<pubDate>`, or now when it is missing or malformed.
pub fn pub_date_or_now(prelude: &[u8]) -> DateTime<Utc> {
    parse_pub_date(prelude).unwrap_or_else(|| {
        log::debug!("No usable channel <pubDate>, using current time");
        Utc::now()
    })
}

/// Strong ETag for a document body.
pub fn etag(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(data)))
}

/// Build one show's feed from the shared regions and its episode blocks.
///
/// `items` must be in source order; they are copied through untouched.
pub fn assemble(
    show: &str,
    slug: &str,
    prelude: &[u8],
    items: &[&[u8]],
    postlude: &[u8],
) -> Result<ShowFeed> {
    let prelude = apply_edits(prelude, plan_edits(prelude, show))?;
    let data = concat_feed(&prelude, items, postlude);

    Ok(ShowFeed {
        slug: slug.to_string(),
        title: show.to_string(),
        pub_date: pub_date_or_now(&prelude),
        etag: etag(&data),
        episode_count: items.len(),
        data: Bytes::from(data),
    })
}
