//! Identifier normalization.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalizes a raw identifier into lowercase ASCII words separated by single spaces.
///
/// Splits camelCase boundaries and underscores, strips diacritics (including the
/// Vietnamese `đ`), lowercases and replaces anything outside `[a-z0-9]` with a space.
pub fn normalize(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() + 8);
    let mut previous: Option<char> = None;
    for c in text.chars() {
        if c == '_' {
            spaced.push(' ');
            previous = None;
            continue;
        }
        if let Some(prev) = previous
            && prev.is_lowercase()
            && c.is_uppercase()
        {
            spaced.push(' ');
        }
        spaced.push(c);
        previous = Some(c);
    }

    let mut cleaned = String::with_capacity(spaced.len());
    for c in spaced.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        let c = match c {
            'đ' | 'Đ' => 'd',
            other => other,
        };
        for lower in c.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
                cleaned.push(lower);
            } else {
                cleaned.push(' ');
            }
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
