//! Notice data structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator used when list fields are flattened into a single ledger cell.
const LIST_SEPARATOR: &str = ", ";

/// A notice as supplied by a feed adapter, before any enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RawNotice {
    /// Tag of the originating feed
    #[serde(default)]
    pub source: String,

    /// Publication date as scraped
    #[serde(default)]
    pub publication_date_raw: String,

    /// Effective date as scraped
    #[serde(default)]
    pub effective_date_raw: String,

    /// Federal Register citation
    #[serde(default)]
    pub citation: String,

    /// Notice title
    pub title: String,

    /// Link to the notice document
    #[serde(default)]
    pub url: String,
}

/// A fully processed notice, one ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoticeRecord {
    pub source: String,
    pub publication_date_raw: String,
    pub effective_date_raw: String,

    /// Canonical publication date, absent when the raw text was unparsable
    pub publication_date: Option<NaiveDate>,

    pub citation: String,
    pub title: String,

    /// Dedup key across the ledger
    pub url: String,

    pub document_downloaded: bool,
    pub document_path: Option<String>,

    pub contains_code: bool,
    pub code_count: usize,

    /// Sorted, duplicate-free classification codes
    pub codes_found: Vec<String>,

    /// Risk keywords found in the title, in keyword-list order
    pub matched_keywords: Vec<String>,

    /// True when `matched_keywords` is non-empty
    pub flagged: bool,
}

impl NoticeRecord {
    /// Start an unenriched record from a raw notice.
    pub fn from_raw(raw: RawNotice) -> Self {
        Self {
            source: raw.source,
            publication_date_raw: raw.publication_date_raw,
            effective_date_raw: raw.effective_date_raw,
            publication_date: None,
            citation: raw.citation,
            title: raw.title,
            url: raw.url,
            document_downloaded: false,
            document_path: None,
            contains_code: false,
            code_count: 0,
            codes_found: Vec::new(),
            matched_keywords: Vec::new(),
            flagged: false,
        }
    }

    /// Replace the code fields from a scan result.
    pub fn set_codes(&mut self, codes: Vec<String>) {
        self.code_count = codes.len();
        self.contains_code = !codes.is_empty();
        self.codes_found = codes;
    }

    /// Replace the keyword fields; `flagged` follows from the matches.
    pub fn set_keywords(&mut self, matched: Vec<String>) {
        self.flagged = !matched.is_empty();
        self.matched_keywords = matched;
    }

    /// Format notice for display using a template.
    ///
    /// Supported placeholders:
    /// - `{source}`, `{citation}`, `{title}`, `{url}`
    /// - `{date}` (canonical date, or the raw text when unparsed)
    /// - `{codes}`, `{keywords}`
    pub fn format(&self, template: &str) -> String {
        let date = self
            .publication_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| self.publication_date_raw.clone());
        template
            .replace("{source}", &self.source)
            .replace("{citation}", &self.citation)
            .replace("{title}", &self.title)
            .replace("{url}", &self.url)
            .replace("{date}", &date)
            .replace("{codes}", &self.codes_found.join(LIST_SEPARATOR))
            .replace("{keywords}", &self.matched_keywords.join(LIST_SEPARATOR))
    }
}

/// Flat CSV form of [`NoticeRecord`].
///
/// Field order here is the column order of every ledger partition and raw
/// batch file. Changing it invalidates the batch-equality check against
/// files written by earlier versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerRow {
    pub source: String,
    pub publication_date_raw: String,
    pub effective_date_raw: String,
    pub publication_date: Option<NaiveDate>,
    pub citation: String,
    pub title: String,
    pub url: String,
    pub document_downloaded: bool,
    pub document_path: Option<String>,
    pub contains_code: bool,
    pub code_count: usize,
    pub codes_found: String,
    pub matched_keywords: String,
    pub flagged: bool,
}

impl From<&NoticeRecord> for LedgerRow {
    fn from(record: &NoticeRecord) -> Self {
        Self {
            source: record.source.clone(),
            publication_date_raw: record.publication_date_raw.clone(),
            effective_date_raw: record.effective_date_raw.clone(),
            publication_date: record.publication_date,
            citation: record.citation.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
            document_downloaded: record.document_downloaded,
            document_path: record.document_path.clone(),
            contains_code: record.contains_code,
            code_count: record.code_count,
            codes_found: record.codes_found.join(LIST_SEPARATOR),
            matched_keywords: record.matched_keywords.join(LIST_SEPARATOR),
            flagged: record.flagged,
        }
    }
}

impl From<LedgerRow> for NoticeRecord {
    fn from(row: LedgerRow) -> Self {
        Self {
            source: row.source,
            publication_date_raw: row.publication_date_raw,
            effective_date_raw: row.effective_date_raw,
            publication_date: row.publication_date,
            citation: row.citation,
            title: row.title,
            url: row.url,
            document_downloaded: row.document_downloaded,
            document_path: row.document_path.filter(|p| !p.is_empty()),
            contains_code: row.contains_code,
            code_count: row.code_count,
            codes_found: split_list(&row.codes_found),
            matched_keywords: split_list(&row.matched_keywords),
            flagged: row.flagged,
        }
    }
}

fn split_list(cell: &str) -> Vec<String> {
    cell.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> NoticeRecord {
        let mut record = NoticeRecord::from_raw(RawNotice {
            source: "BIS Federal Register".to_string(),
            publication_date_raw: "01/15/2025".to_string(),
            effective_date_raw: "01/15/2025".to_string(),
            citation: "90 FR 4544".to_string(),
            title: "Framework for Artificial Intelligence Diffusion".to_string(),
            url: "https://www.govinfo.gov/content/pkg/FR-2025-01-15/pdf/2025-00636.pdf"
                .to_string(),
        });
        record.publication_date = NaiveDate::from_ymd_opt(2025, 1, 15);
        record.set_codes(vec!["3A090.a".to_string(), "4E091".to_string()]);
        record.set_keywords(vec!["Final Rule".to_string()]);
        record
    }

    #[test]
    fn test_format() {
        let record = sample_record();
        let result = record.format("[{date}] {citation}: {codes}");
        assert_eq!(result, "[2025-01-15] 90 FR 4544: 3A090.a, 4E091");
    }

    #[test]
    fn test_format_falls_back_to_raw_date() {
        let mut record = sample_record();
        record.publication_date = None;
        record.publication_date_raw = "sometime in May".to_string();
        assert_eq!(record.format("{date}"), "sometime in May");
    }

    #[test]
    fn test_derived_fields() {
        let record = sample_record();
        assert!(record.contains_code);
        assert_eq!(record.code_count, 2);
        assert!(record.flagged);

        let mut unflagged = record.clone();
        unflagged.set_keywords(Vec::new());
        assert!(!unflagged.flagged);
    }

    #[test]
    fn test_ledger_row_restores_lists() {
        let record = sample_record();
        let row = LedgerRow::from(&record);
        assert_eq!(row.codes_found, "3A090.a, 4E091");
        assert_eq!(NoticeRecord::from(row), record);
    }

    #[test]
    fn test_empty_list_cell() {
        assert!(split_list("").is_empty());
    }
}
