//! Byte-range replacement planned against one buffer.

use std::ops::Range;

/// Replace `buf[offset..end]` with `text`.
///
/// An edit is only meaningful for the buffer it was planned against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn new(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            offset: range.start,
            end: range.end,
            text: text.into(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end
    }
}
