// src/utils/slug.rs

//! Show name to slug normalization.

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Convert a show's display name into its slug.
///
/// Whitespace and punctuation turn into a single `-` per run; every other
/// character is lowercased as-is (no transliteration). The result is not
/// trimmed, so a name that starts or ends with punctuation keeps a stray
/// hyphen there.
///
/// # Examples
/// ```
/// use feedsplit::utils::slug::slugify;
///
/// assert_eq!(slugify("Badlands Live! 9-5"), "badlands-live-9-5");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_whitespace() || is_punctuation(c) {
            if !in_run {
                slug.push('-');
                in_run = true;
            }
            continue;
        }
        in_run = false;
        slug.extend(c.to_lowercase());
    }

    slug
}

/// Unicode general category P (connector, dash, open, close, initial, final
/// and other punctuation).
///
/// Symbols such as `$`, `+` or `|` are category S and pass through.
fn is_punctuation(c: char) -> bool {
    c.general_category_group() == GeneralCategoryGroup::Punctuation
}
