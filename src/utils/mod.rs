//! Utility functions and helpers.

pub mod entities;
pub mod http;
pub mod slug;

/// Locate the body of the first `open`...`close` element in `buf`.
///
/// Both tags are searched independently from the start of `buf`, so the
/// returned range is only meaningful when the first `close` follows the
/// first `open`. Returns `None` when either tag is missing or they are out
/// of order.
pub fn find_element(buf: &[u8], open: &[u8], close: &[u8]) -> Option<std::ops::Range<usize>> {
    let start = memchr::memmem::find(buf, open)? + open.len();
    let end = memchr::memmem::find(buf, close)?;
    (start <= end).then_some(start..end)
}
