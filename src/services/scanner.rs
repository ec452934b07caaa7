// src/services/scanner.rs

//! Byte-region scanner for the aggregated feed document.
//!
//! Splits a feed into three regions by searching for literal tags, without
//! building a DOM:
//!
//! ```text
//! <?xml ...><rss ...><channel> ... </image>   prelude
//!     <item> ... </item>                      episode block
//!     <item> ... </item>                      episode block
//! </channel></rss>                            postlude
//! ```
//!
//! The prelude stops at the last `>` before the first `<item>`; every other
//! region is expected to start with its own newline. Each episode block runs
//! from the end of the previous region through its `</item>`, so prelude,
//! blocks and postlude concatenate back into the original document.
//!
//! A structural problem puts the scanner into a permanent error state. All
//! later calls return empty regions and the error is reported by
//! [`FeedScanner::finish`], which callers check once iteration is done.

use std::borrow::Cow;
use std::iter::FusedIterator;

use memchr::{memmem, memrchr};

use crate::error::{AppError, Result};
use crate::utils::find_element;

const ITEM_OPEN: &[u8] = b"<item>";
const ITEM_CLOSE: &[u8] = b"</item>";
const TITLE_OPEN: &[u8] = b"<title>";
const TITLE_CLOSE: &[u8] = b"</title>";

/// One episode block together with its raw `<title>` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Episode<'a> {
    /// The block bytes exactly as they appear in the source
    pub block: &'a [u8],
    /// Body of the first `<title>` in the block, still entity-escaped
    pub title: &'a [u8],
}

impl<'a> Episode<'a> {
    /// The raw title as text; invalid UTF-8 is replaced, not rejected.
    pub fn title_text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.title)
    }
}

/// Single-pass scanner over one feed document.
#[derive(Debug)]
pub struct FeedScanner<'a> {
    data: &'a [u8],
    err: Option<&'static str>,
    scanned: bool,
}

impl<'a> FeedScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            err: None,
            scanned: false,
        }
    }

    /// Channel header up to and including the last `>` before the first
    /// `<item>`.
    pub fn prelude(&mut self) -> &'a [u8] {
        match self.prelude_end() {
            Some(end) => &self.data[..end],
            None => &[],
        }
    }

    /// Trailer after the last `</item>`.
    pub fn postlude(&mut self) -> &'a [u8] {
        if self.err.is_some() {
            return &[];
        }
        match memmem::rfind(self.data, ITEM_CLOSE) {
            Some(i) => &self.data[i + ITEM_CLOSE.len()..],
            None => {
                self.fail("no </item> element");
                &[]
            }
        }
    }

    /// Episode blocks in document order.
    ///
    /// The scan happens once per scanner: a second call yields nothing.
    pub fn items(&mut self) -> Items<'_, 'a> {
        let pos = if self.scanned { None } else { self.prelude_end() };
        self.scanned = true;
        Items { scanner: self, pos }
    }

    /// Whether a structural error has been hit.
    pub fn is_corrupt(&self) -> bool {
        self.err.is_some()
    }

    /// Report the scanner's terminal state.
    pub fn finish(self) -> Result<()> {
        match self.err {
            Some(reason) => Err(AppError::CorruptFeed(reason)),
            None => Ok(()),
        }
    }

    fn prelude_end(&mut self) -> Option<usize> {
        if self.err.is_some() {
            return None;
        }
        let Some(first_item) = memmem::find(self.data, ITEM_OPEN) else {
            self.fail("no <item> element");
            return None;
        };
        let Some(last_tag) = memrchr(b'>', &self.data[..first_item]) else {
            self.fail("no tag before the first <item>");
            return None;
        };
        Some(last_tag + 1)
    }

    fn fail(&mut self, reason: &'static str) {
        self.err.get_or_insert(reason);
    }
}

/// Iterator returned by [`FeedScanner::items`].
#[derive(Debug)]
pub struct Items<'s, 'a> {
    scanner: &'s mut FeedScanner<'a>,
    pos: Option<usize>,
}

impl<'a> Iterator for Items<'_, 'a> {
    type Item = Episode<'a>;

    fn next(&mut self) -> Option<Episode<'a>> {
        let pos = self.pos?;
        if self.scanner.err.is_some() {
            self.pos = None;
            return None;
        }

        let data = self.scanner.data;
        let Some(i) = memmem::find(&data[pos..], ITEM_CLOSE) else {
            self.pos = None;
            let last_end = memmem::rfind(data, ITEM_CLOSE).map(|j| j + ITEM_CLOSE.len());
            if last_end != Some(pos) {
                self.scanner.fail("unterminated <item> element");
            }
            return None;
        };

        let end = pos + i + ITEM_CLOSE.len();
        let block = &data[pos..end];
        let Some(title) = find_element(block, TITLE_OPEN, TITLE_CLOSE) else {
            self.pos = None;
            self.scanner.fail("<item> without <title>");
            return None;
        };

        self.pos = Some(end);
        Some(Episode {
            block,
            title: &block[title],
        })
    }
}

impl FusedIterator for Items<'_, '_> {}

/// A fully scanned feed document.
#[derive(Debug, Clone)]
pub struct ParsedFeed<'a> {
    pub prelude: &'a [u8],
    pub episodes: Vec<Episode<'a>>,
    pub postlude: &'a [u8],
}

/// Scan `data` into prelude, episodes and postlude.
pub fn parse(data: &[u8]) -> Result<ParsedFeed<'_>> {
    let mut scanner = FeedScanner::new(data);
    let prelude = scanner.prelude();
    let postlude = scanner.postlude();
    let episodes: Vec<_> = scanner.items().collect();
    scanner.finish()?;

    Ok(ParsedFeed {
        prelude,
        episodes,
        postlude,
    })
}
