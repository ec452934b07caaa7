// src/utils/entities.rs

//! Entity decoding for episode titles and text escaping for header edits.
//!
//! Titles arrive with escaped punctuation (`&amp;`, `&#8217;`, `&rsquo;`) and
//! have to be read back as the human-readable show name. Show names going the
//! other way are spliced into raw header bytes, so they get escaped as XML
//! character data.
//!
//! Both directions return `Cow` so text without anything to convert is never
//! copied.

use std::borrow::Cow;

use html_escape::decode_html_entities;
use memchr::{memchr, memchr3};

/// Windows-1252 characters for references `&#128;` through `&#159;`.
///
/// Browsers read C1 control references as the code page characters legacy
/// editors meant; undefined slots stay as they are.
const WINDOWS_1252_C1: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decode HTML entity references in `text`.
///
/// Named references use the full HTML5 entity table; character references
/// in the C1 range are read as Windows-1252. Unknown or malformed references
/// are kept verbatim.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }

    match remap_c1_references(text) {
        Cow::Borrowed(text) => decode_html_entities(text),
        Cow::Owned(text) => Cow::Owned(decode_html_entities(&text).into_owned()),
    }
}

/// Rewrite `&#128;`..`&#159;` (decimal or hex) to their Windows-1252
/// characters, leaving every other reference for the entity decoder.
fn remap_c1_references(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out: Option<String> = None;
    let mut pos = 0;
    let mut copied = 0;

    while let Some(amp) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + amp;
        pos = amp + 1;

        // Character references are short; a distant ';' belongs to something else.
        let window = &bytes[amp + 1..bytes.len().min(amp + 12)];
        let Some(semi) = memchr(b';', window) else {
            continue;
        };
        let Some(c) = text[amp + 1..amp + 1 + semi]
            .strip_prefix('#')
            .and_then(parse_codepoint)
            .filter(|cp| (0x80..=0x9F).contains(cp))
            .map(|cp| WINDOWS_1252_C1[(cp - 0x80) as usize])
        else {
            continue;
        };

        let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
        buf.push_str(&text[copied..amp]);
        buf.push(c);
        pos = amp + semi + 2;
        copied = pos;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Parse the digits of a character reference (`146`, `x92`).
fn parse_codepoint(num: &str) -> Option<u32> {
    match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => num.parse().ok(),
    }
}

/// Escape `text` for insertion into XML character data.
///
/// Quotes and control whitespace are written as character references so the
/// result is also safe inside attribute values.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let needs_escape = memchr3(b'&', b'<', b'>', bytes).is_some()
        || bytes
            .iter()
            .any(|b| matches!(b, b'"' | b'\'' | b'\t' | b'\n' | b'\r'));
    if !needs_escape {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
