// src/pipeline/merge.rs

//! Ledger merging.
//!
//! The ledger is partitioned by quarter. A batch is appended after the
//! existing rows and deduplicated by URL, keeping the first occurrence, so a
//! notice already in the ledger is never overwritten by a later re-scrape.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{LedgerPeriod, NoticeRecord};
use crate::storage::LedgerStorage;

/// Result of a merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The partition as persisted
    pub records: Vec<NoticeRecord>,
    /// Rows the batch added
    pub added: usize,
}

/// Concatenate `batch` after `existing` and keep the first row per URL.
///
/// Records with an empty URL share one key, so only the first of them
/// survives.
pub fn merge_records(existing: Vec<NoticeRecord>, batch: &[NoticeRecord]) -> Vec<NoticeRecord> {
    let mut seen = HashSet::new();
    existing
        .into_iter()
        .chain(batch.iter().cloned())
        .filter(|record| seen.insert(record.url.clone()))
        .collect()
}

/// Whether `batch_bytes` equals the last persisted raw batch exactly.
///
/// An unreadable previous batch counts as different.
pub async fn is_repeat_batch(storage: &dyn LedgerStorage, batch_bytes: &[u8]) -> bool {
    match storage.latest_raw_batch().await {
        Ok(Some(previous)) => previous == batch_bytes,
        Ok(None) => false,
        Err(e) => {
            log::warn!("Previous raw batch unreadable, treating batch as new: {}", e);
            false
        }
    }
}

/// Merges batches into quarterly partitions.
pub struct LedgerMerger<'a> {
    storage: &'a dyn LedgerStorage,
}

impl<'a> LedgerMerger<'a> {
    pub fn new(storage: &'a dyn LedgerStorage) -> Self {
        Self { storage }
    }

    /// Merge `batch` into the partition for `period` and persist it.
    ///
    /// Any read or write failure is a persistence error and ends the run.
    pub async fn merge(&self, period: LedgerPeriod, batch: &[NoticeRecord]) -> Result<MergeOutcome> {
        let existing = self.storage.load_partition(period).await?.unwrap_or_default();
        let before = existing.len();

        let records = merge_records(existing, batch);
        self.storage.write_partition(period, &records).await?;

        let added = records.len().saturating_sub(before);
        log::info!(
            "Merged {} of {} batch rows into {} ({} total)",
            added,
            batch.len(),
            period,
            records.len()
        );
        Ok(MergeOutcome { records, added })
    }
}
