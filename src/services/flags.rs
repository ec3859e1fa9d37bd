// src/services/flags.rs

//! Risk keyword flagging on notice titles.

use crate::models::NoticeRecord;

/// Keywords used when the configuration does not override them.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Entity List",
    "Final Rule",
    "Huawei",
    "SMIC",
    "military end use",
    "PRC",
];

/// Flags notices whose title mentions a risk keyword.
///
/// Matching is a case-insensitive substring test, so `PRC` also matches
/// inside longer words.
#[derive(Debug, Clone)]
pub struct KeywordFlagger {
    /// (keyword as configured, lower-cased keyword)
    keywords: Vec<(String, String)>,
}

impl KeywordFlagger {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(|k| (k.to_string(), k.to_lowercase()))
            .collect();
        Self { keywords }
    }

    /// Keywords found in `title`, in keyword-list order.
    pub fn matches(&self, title: &str) -> Vec<String> {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .filter(|(_, lowered)| title.contains(lowered.as_str()))
            .map(|(keyword, _)| keyword.clone())
            .collect()
    }

    /// Set `matched_keywords` and `flagged` on the record.
    pub fn flag(&self, record: &mut NoticeRecord) {
        let matched = self.matches(&record.title);
        record.set_keywords(matched);
    }
}

impl Default for KeywordFlagger {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}
