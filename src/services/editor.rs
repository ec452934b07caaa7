// src/services/editor.rs

//! Header edits for per-show feeds.
//!
//! The shared channel header is rewritten by splicing replacement text into
//! byte ranges rather than re-serializing XML, so everything outside the
//! edited element bodies stays byte-identical to the source.

use std::borrow::Cow;

use crate::error::{AppError, Result};
use crate::models::Edit;
use crate::utils::entities::escape_text;
use crate::utils::find_element;

const TITLE_OPEN: &[u8] = b"<title>";
const TITLE_CLOSE: &[u8] = b"</title>";
const IMAGE_OPEN: &[u8] = b"<image>";
const IMAGE_CLOSE: &[u8] = b"</image>";
const ITUNES_NAME_OPEN: &[u8] = b"<itunes:name>";
const ITUNES_NAME_CLOSE: &[u8] = b"</itunes:name>";
const ITUNES_BLOCK_OPEN: &[u8] = b"<itunes:block>";
const ITUNES_BLOCK_CLOSE: &[u8] = b"</itunes:block>";

/// `<itunes:block>` value that keeps a feed out of podcast directories.
pub const PRIVATE_MARKER: &str = "Yes";

/// Plan the name substitutions for one show.
///
/// The channel `<title>` is only rewritten when it provably sits outside the
/// `<image>` block; without an `<image>` block the title is left alone. The
/// `<itunes:name>` owner name is rewritten whenever present.
pub fn plan_show_title(prelude: &[u8], name: &str) -> Vec<Edit> {
    let name = escape_text(name);
    let mut edits = Vec::with_capacity(2);

    if let (Some(image), Some(title)) = (
        find_element(prelude, IMAGE_OPEN, IMAGE_CLOSE),
        find_element(prelude, TITLE_OPEN, TITLE_CLOSE),
    ) {
        let before_image = title.end < image.start;
        let after_image = title.start > image.end;
        if before_image || after_image {
            edits.push(Edit::new(title, &*name));
        }
    }

    if let Some(owner) = find_element(prelude, ITUNES_NAME_OPEN, ITUNES_NAME_CLOSE) {
        edits.push(Edit::new(owner, &*name));
    }

    edits
}

/// Plan flipping `<itunes:block>` to the private marker, if the header has
/// one.
pub fn plan_private(prelude: &[u8]) -> Option<Edit> {
    find_element(prelude, ITUNES_BLOCK_OPEN, ITUNES_BLOCK_CLOSE)
        .map(|flag| Edit::new(flag, PRIVATE_MARKER))
}

/// Every header edit for one show's feed.
pub fn plan_edits(prelude: &[u8], name: &str) -> Vec<Edit> {
    let mut edits = plan_show_title(prelude, name);
    edits.extend(plan_private(prelude));
    edits
}

/// Apply `edits` to `buf`, returning the edited copy.
///
/// Edits may come in any order. With no edits the input is handed back
/// without copying. Edits that overlap or run past the buffer are rejected.
pub fn apply_edits(buf: &[u8], mut edits: Vec<Edit>) -> Result<Cow<'_, [u8]>> {
    if edits.is_empty() {
        return Ok(Cow::Borrowed(buf));
    }

    edits.sort_by_key(|e| e.offset);

    let mut size = buf.len();
    let mut prev: Option<&Edit> = None;
    for edit in &edits {
        if edit.offset > edit.end || edit.end > buf.len() {
            return Err(AppError::EditOutOfBounds {
                range: edit.range(),
                len: buf.len(),
            });
        }
        if let Some(prev) = prev.filter(|p| edit.offset < p.end) {
            return Err(AppError::OverlappingEdits {
                first: prev.range(),
                second: edit.range(),
            });
        }
        size = size - (edit.end - edit.offset) + edit.text.len();
        prev = Some(edit);
    }

    let mut out = Vec::with_capacity(size);
    let mut pos = 0;
    for edit in &edits {
        out.extend_from_slice(&buf[pos..edit.offset]);
        out.extend_from_slice(edit.text.as_bytes());
        pos = edit.end;
    }
    out.extend_from_slice(&buf[pos..]);

    Ok(Cow::Owned(out))
}
