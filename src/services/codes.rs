// src/services/codes.rs

//! Export control classification code scanning.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Digit, letter, three digits, then an optional `.suffix`.
static CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[0-9][A-Z][0-9]{3}(?:\.[a-z0-9]+)?\b").expect("classification code pattern")
});

/// Find every distinct classification code in `text`.
///
/// Codes are normalized (category letter upper case, suffix lower case) so
/// `3a090.A` and `3A090.a` count once. The result is sorted.
///
/// # Examples
/// ```
/// use regulus::services::scan_codes;
///
/// let codes = scan_codes("Items 3A090.a and 9D991 are controlled");
/// assert_eq!(codes, vec!["3A090.a", "9D991"]);
/// ```
pub fn scan_codes(text: &str) -> Vec<String> {
    CODE_PATTERN
        .find_iter(text)
        .map(|m| normalize_code(m.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_code(token: &str) -> String {
    match token.split_once('.') {
        Some((head, suffix)) => format!(
            "{}.{}",
            head.to_ascii_uppercase(),
            suffix.to_ascii_lowercase()
        ),
        None => token.to_ascii_uppercase(),
    }
}
