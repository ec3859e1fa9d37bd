//! Local filesystem storage implementation.
//!
//! All writes go to a sibling `.tmp` file first and are renamed into place,
//! so a reader sees either the old file or the new one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{InsightSnapshot, LedgerPeriod, NoticeRecord};
use crate::pipeline::ExportWorkbook;
use crate::storage::{LedgerStorage, decode_records, encode_records};

const LEDGER_DIR: &str = "ledger";
const RAW_DIR: &str = "raw";
const INSIGHTS_DIR: &str = "insights";
const REPORTS_DIR: &str = "reports";
const DOCUMENTS_DIR: &str = "pdfs";

const PARTITION_PREFIX: &str = "BIS_master_";
const RAW_PREFIX: &str = "export_updates_";
const SNAPSHOT_PREFIX: &str = "export_insights_";
const REPORT_PREFIX: &str = "changes_report_";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    fn partition_key(period: LedgerPeriod) -> String {
        format!("{LEDGER_DIR}/{PARTITION_PREFIX}{}.csv", period.label())
    }

    fn export_key(period: LedgerPeriod) -> String {
        format!("{LEDGER_DIR}/{PARTITION_PREFIX}{}.export.json", period.label())
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Io(e));
        }
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// File names in `dir` matching prefix and suffix, sorted ascending.
    async fn list_names(&self, dir: &str, prefix: &str, suffix: &str) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(self.path(dir)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(prefix) && name.ends_with(suffix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Parse `BIS_master_2025_Q1.csv` back into its period.
    fn parse_partition_name(name: &str) -> Option<LedgerPeriod> {
        let label = name.strip_prefix(PARTITION_PREFIX)?.strip_suffix(".csv")?;
        let (year, quarter) = label.split_once("_Q")?;
        let quarter: u32 = quarter.parse().ok()?;
        if !(1..=4).contains(&quarter) {
            return None;
        }
        Some(LedgerPeriod {
            year: year.parse().ok()?,
            quarter,
        })
    }
}

#[async_trait]
impl LedgerStorage for LocalStorage {
    async fn load_partition(&self, period: LedgerPeriod) -> Result<Option<Vec<NoticeRecord>>> {
        let key = Self::partition_key(period);
        let path = self.path(&key);
        let bytes = match self.read_bytes(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => return Err(AppError::persistence(path, e)),
        };
        decode_records(&bytes)
            .map(Some)
            .map_err(|e| AppError::persistence(path, e))
    }

    async fn write_partition(&self, period: LedgerPeriod, records: &[NoticeRecord]) -> Result<()> {
        let key = Self::partition_key(period);
        let path = self.path(&key);
        let bytes = encode_records(records).map_err(|e| AppError::persistence(&path, e))?;
        self.write_bytes(&key, &bytes)
            .await
            .map_err(|e| AppError::persistence(&path, e))?;
        log::info!("Ledger: {} rows written to {}", records.len(), key);
        Ok(())
    }

    async fn list_partitions(&self) -> Result<Vec<LedgerPeriod>> {
        let names = self.list_names(LEDGER_DIR, PARTITION_PREFIX, ".csv").await?;
        let mut periods: Vec<LedgerPeriod> = names
            .iter()
            .filter_map(|name| Self::parse_partition_name(name))
            .collect();
        periods.sort();
        Ok(periods)
    }

    async fn latest_raw_batch(&self) -> Result<Option<Vec<u8>>> {
        let names = self.list_names(RAW_DIR, RAW_PREFIX, ".csv").await?;
        match names.last() {
            Some(name) => self.read_bytes(&format!("{RAW_DIR}/{name}")).await,
            None => Ok(None),
        }
    }

    async fn write_raw_batch(&self, stamp: &str, bytes: &[u8]) -> Result<String> {
        let key = format!("{RAW_DIR}/{RAW_PREFIX}{stamp}.csv");
        self.write_bytes(&key, bytes).await?;
        Ok(key)
    }

    async fn write_export(&self, period: LedgerPeriod, export: &ExportWorkbook) -> Result<String> {
        let key = Self::export_key(period);
        self.write_json(&key, export).await?;
        Ok(key)
    }

    async fn write_snapshot(&self, stamp: &str, snapshot: &InsightSnapshot) -> Result<String> {
        let key = format!("{INSIGHTS_DIR}/{SNAPSHOT_PREFIX}{stamp}.json");
        self.write_json(&key, snapshot).await?;
        Ok(key)
    }

    async fn list_snapshots(&self) -> Result<Vec<String>> {
        let names = self
            .list_names(INSIGHTS_DIR, SNAPSHOT_PREFIX, ".json")
            .await?;
        Ok(names
            .into_iter()
            .map(|name| format!("{INSIGHTS_DIR}/{name}"))
            .collect())
    }

    async fn load_snapshot(&self, key: &str) -> Result<InsightSnapshot> {
        self.read_json(key)
            .await?
            .ok_or_else(|| AppError::validation(format!("snapshot {key} not found")))
    }

    async fn write_report(&self, stamp: &str, markdown: &str) -> Result<String> {
        let key = format!("{REPORTS_DIR}/{REPORT_PREFIX}{stamp}.md");
        self.write_bytes(&key, markdown.as_bytes()).await?;
        Ok(key)
    }

    fn documents_dir(&self) -> PathBuf {
        self.path(DOCUMENTS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityAddition, RawNotice};
    use tempfile::TempDir;

    const Q1: LedgerPeriod = LedgerPeriod {
        year: 2025,
        quarter: 1,
    };

    fn record(url: &str) -> NoticeRecord {
        NoticeRecord::from_raw(RawNotice {
            source: "BIS Federal Register".to_string(),
            title: format!("Notice at {url}"),
            url: url.to_string(),
            ..RawNotice::default()
        })
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
        assert!(storage.load_partition(Q1).await.unwrap().is_none());
        assert!(storage.latest_raw_batch().await.unwrap().is_none());
        assert!(storage.list_snapshots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partition_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let records = vec![record("https://a.gov/1.pdf"), record("https://a.gov/2.pdf")];

        storage.write_partition(Q1, &records).await.unwrap();

        assert!(tmp.path().join("ledger/BIS_master_2025_Q1.csv").exists());
        assert_eq!(storage.load_partition(Q1).await.unwrap(), Some(records));
    }

    #[tokio::test]
    async fn test_corrupt_partition_is_persistence_error() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .write_bytes("ledger/BIS_master_2025_Q1.csv", b"garbage\n\"unterminated")
            .await
            .unwrap();

        let err = storage.load_partition(Q1).await.unwrap_err();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_list_partitions() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let q4 = LedgerPeriod {
            year: 2024,
            quarter: 4,
        };
        storage.write_partition(Q1, &[]).await.unwrap();
        storage.write_partition(q4, &[]).await.unwrap();
        storage
            .write_bytes("ledger/notes.csv", b"unrelated")
            .await
            .unwrap();

        assert_eq!(storage.list_partitions().await.unwrap(), vec![q4, Q1]);
    }

    #[tokio::test]
    async fn test_latest_raw_batch() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_raw_batch("2025-01-15_09-00-00", b"older")
            .await
            .unwrap();
        storage
            .write_raw_batch("2025-01-16_09-00-00", b"newer")
            .await
            .unwrap();

        assert_eq!(
            storage.latest_raw_batch().await.unwrap(),
            Some(b"newer".to_vec())
        );
    }

    #[tokio::test]
    async fn test_snapshots_listed_oldest_first() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut snapshot = InsightSnapshot::default();
        snapshot.entity_additions.push(EntityAddition {
            url: "https://a.gov/1.pdf".into(),
            region_or_country: "China".into(),
        });

        storage
            .write_snapshot("2025-01-16_09-00-00", &InsightSnapshot::default())
            .await
            .unwrap();
        let key = storage
            .write_snapshot("2025-01-15_09-00-00", &snapshot)
            .await
            .unwrap();

        let keys = storage.list_snapshots().await.unwrap();
        assert_eq!(
            keys,
            vec![
                "insights/export_insights_2025-01-15_09-00-00.json",
                "insights/export_insights_2025-01-16_09-00-00.json",
            ]
        );
        let loaded = storage.load_snapshot(&key).await.unwrap();
        assert_eq!(loaded.entity_additions, snapshot.entity_additions);
    }

    #[test]
    fn test_parse_partition_name() {
        assert_eq!(
            LocalStorage::parse_partition_name("BIS_master_2025_Q1.csv"),
            Some(Q1)
        );
        assert_eq!(LocalStorage::parse_partition_name("BIS_master_2025_Q5.csv"), None);
        assert_eq!(
            LocalStorage::parse_partition_name("BIS_master_2025_Q1.export.json"),
            None
        );
    }
}
