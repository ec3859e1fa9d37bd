//! Storage abstractions for the notice ledger and run artifacts.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── ledger/
//! │   ├── BIS_master_2025_Q1.csv          # Quarterly ledger partition
//! │   └── BIS_master_2025_Q1.export.json  # Tabular export of the partition
//! ├── raw/
//! │   └── export_updates_2025-01-15_09-30-00.csv   # One batch per run
//! ├── insights/
//! │   └── export_insights_2025-01-15_09-30-00.json # Insight snapshots
//! ├── reports/
//! │   └── changes_report_2025-01-15_09-30-00.md
//! └── pdfs/                               # Downloaded documents
//! ```
//!
//! Ledger partitions and raw batches share one CSV layout, the column order
//! of [`LedgerRow`].

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{InsightSnapshot, LedgerPeriod, LedgerRow, NoticeRecord};
use crate::pipeline::ExportWorkbook;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for ledger storage backends.
///
/// Keys returned by list/write methods are backend-relative locations that
/// can be passed back to the matching load method.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Load a quarterly partition, or `None` if it has never been written.
    ///
    /// An existing but unreadable partition is a persistence error.
    async fn load_partition(&self, period: LedgerPeriod) -> Result<Option<Vec<NoticeRecord>>>;

    /// Replace a quarterly partition. Readers never observe a partial file.
    async fn write_partition(&self, period: LedgerPeriod, records: &[NoticeRecord]) -> Result<()>;

    /// Partitions present, oldest first.
    async fn list_partitions(&self) -> Result<Vec<LedgerPeriod>>;

    /// Bytes of the most recent raw batch, if any.
    async fn latest_raw_batch(&self) -> Result<Option<Vec<u8>>>;

    /// Store this run's raw batch.
    async fn write_raw_batch(&self, stamp: &str, bytes: &[u8]) -> Result<String>;

    /// Store the tabular export for a partition.
    async fn write_export(&self, period: LedgerPeriod, export: &ExportWorkbook) -> Result<String>;

    /// Store this run's insight snapshot.
    async fn write_snapshot(&self, stamp: &str, snapshot: &InsightSnapshot) -> Result<String>;

    /// Snapshot keys, oldest first.
    async fn list_snapshots(&self) -> Result<Vec<String>>;

    /// Load a snapshot by key.
    async fn load_snapshot(&self, key: &str) -> Result<InsightSnapshot>;

    /// Store a rendered change report.
    async fn write_report(&self, stamp: &str, markdown: &str) -> Result<String>;

    /// Directory downloaded documents are written to.
    fn documents_dir(&self) -> PathBuf;
}

/// Serialize records in ledger CSV layout.
///
/// An empty slice encodes to no bytes at all (no header row).
pub fn encode_records(records: &[NoticeRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(LedgerRow::from(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

/// Parse records from ledger CSV layout.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<NoticeRecord>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();
    for row in reader.deserialize::<LedgerRow>() {
        records.push(NoticeRecord::from(row?));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawNotice;
    use chrono::NaiveDate;

    fn record(url: &str, title: &str) -> NoticeRecord {
        let mut record = NoticeRecord::from_raw(RawNotice {
            source: "BIS Federal Register".to_string(),
            publication_date_raw: "01/15/2025".to_string(),
            title: title.to_string(),
            url: url.to_string(),
            ..RawNotice::default()
        });
        record.publication_date = NaiveDate::from_ymd_opt(2025, 1, 15);
        record
    }

    #[test]
    fn test_encode_decode_preserves_records() {
        let mut with_codes = record("https://a.gov/1.pdf", "Rule, with comma");
        with_codes.set_codes(vec!["3A090.a".into(), "4E091".into()]);
        with_codes.document_downloaded = true;
        with_codes.document_path = Some("storage/pdfs/1.pdf".into());
        let mut undated = record("https://a.gov/2.pdf", "Corrections");
        undated.publication_date = None;

        let records = vec![with_codes, undated];
        let bytes = encode_records(&records).unwrap();
        assert_eq!(decode_records(&bytes).unwrap(), records);
    }

    #[test]
    fn test_header_row_and_empty_batch() {
        let bytes = encode_records(&[record("u", "t")]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("source,publication_date_raw,effective_date_raw,publication_date,"));

        assert!(encode_records(&[]).unwrap().is_empty());
        assert!(decode_records(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_foreign_csv() {
        assert!(decode_records(b"name,value\nfoo,1\n").is_err());
    }
}
