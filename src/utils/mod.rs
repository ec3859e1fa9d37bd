//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use self::url::resolve_url;

/// Take at most `max` characters from the start of `text`.
///
/// Counts `char`s, not bytes, so multi-byte text is never split.
pub fn prefix_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shorten `text` to `max` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    let prefix = prefix_chars(text, max);
    if prefix.len() < text.len() {
        format!("{prefix}...")
    } else {
        text.to_string()
    }
}
