// src/pipeline/scan.rs

//! Scan pipeline.
//!
//! One run: fetch the feed, enrich every notice, stop early if the batch is
//! identical to the previous run's, otherwise merge into the current
//! quarter's ledger, write the export and insight snapshot, and render a
//! change report against the previous snapshot.

use std::fmt;

use chrono::{DateTime, Local, Utc};

use crate::error::{HistoryUnavailable, Result};
use crate::models::LedgerPeriod;
use crate::pipeline::diff::ChangeDetector;
use crate::pipeline::enrich::{EnrichStats, Enricher, RunContext, sort_newest_first};
use crate::pipeline::export::ExportWorkbook;
use crate::pipeline::merge::{LedgerMerger, is_repeat_batch};
use crate::pipeline::report::render_report;
use crate::services::NoticeSource;
use crate::storage::{LedgerStorage, encode_records};

/// File-name timestamp for per-run artifacts.
const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ledger merged and artifacts written
    Completed,
    /// Batch identical to the previous run; nothing written
    NoNewData,
}

/// Summary of a scan run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub period: LedgerPeriod,
    pub notices_fetched: usize,
    pub flagged: usize,
    pub stats: EnrichStats,
    /// Partition size after the merge
    pub ledger_rows: usize,
    pub rows_added: usize,
    pub entity_additions: usize,
    pub rule_notes: usize,
    /// New items in the change report, if one was written
    pub changes: Option<usize>,
    pub report_location: Option<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outcome == RunOutcome::NoNewData {
            return write!(
                f,
                "No new data: {} notices identical to the previous run",
                self.notices_fetched
            );
        }
        writeln!(f, "Period:      {}", self.period)?;
        writeln!(f, "Notices:     {} fetched, {} flagged", self.notices_fetched, self.flagged)?;
        writeln!(
            f,
            "Documents:   {} downloaded, {} failed, {} unreadable",
            self.stats.documents_downloaded,
            self.stats.acquisition_failures,
            self.stats.extraction_failures
        )?;
        writeln!(f, "Dates:       {} unparsed", self.stats.unparsed_dates)?;
        writeln!(f, "Ledger:      {} rows ({} new)", self.ledger_rows, self.rows_added)?;
        writeln!(
            f,
            "Insights:    {} entity additions, {} rule notes",
            self.entity_additions, self.rule_notes
        )?;
        match (&self.report_location, self.changes) {
            (Some(location), Some(changes)) => {
                write!(f, "Report:      {} ({} new items)", location, changes)
            }
            _ => write!(f, "Report:      skipped"),
        }
    }
}

/// Run one scan against `source`, persisting into `storage`.
///
/// `now` fixes the ledger quarter and the artifact timestamps. Only feed
/// and ledger failures end the run with an error; export, snapshot and
/// report failures are logged and leave the ledger as merged.
pub async fn run_scan(
    source: &dyn NoticeSource,
    enricher: &Enricher,
    storage: &dyn LedgerStorage,
    now: DateTime<Local>,
) -> Result<RunSummary> {
    let period = LedgerPeriod::containing(now.date_naive());
    let stamp = now.format(STAMP_FORMAT).to_string();
    log::info!("Scanning {} into ledger {}", source.describe(), period);

    let batch = source.fetch().await?;
    log::info!("Fetched {} notices", batch.len());

    let mut ctx = RunContext::new();
    let mut records = enricher.enrich_all(batch, &mut ctx).await;
    sort_newest_first(&mut records);

    let mut summary = RunSummary {
        outcome: RunOutcome::Completed,
        period,
        notices_fetched: records.len(),
        flagged: records.iter().filter(|r| r.flagged).count(),
        stats: ctx.stats.clone(),
        ledger_rows: 0,
        rows_added: 0,
        entity_additions: ctx.entity_additions.len(),
        rule_notes: ctx.rule_notes.len(),
        changes: None,
        report_location: None,
    };

    let batch_bytes = encode_records(&records)?;
    if is_repeat_batch(storage, &batch_bytes).await {
        log::info!("No new data since the previous run; skipping merge and reports");
        summary.outcome = RunOutcome::NoNewData;
        return Ok(summary);
    }

    let merged = LedgerMerger::new(storage).merge(period, &records).await?;
    summary.ledger_rows = merged.records.len();
    summary.rows_added = merged.added;

    // Written after the merge so a failed merge is retried next run.
    match storage.write_raw_batch(&stamp, &batch_bytes).await {
        Ok(key) => log::info!("Raw batch saved to {}", key),
        Err(e) => log::error!("Failed to save raw batch: {}", e),
    }

    let generated_at: DateTime<Utc> = now.with_timezone(&Utc);
    let export = ExportWorkbook::build(period, &merged.records, &records, generated_at);
    match storage.write_export(period, &export).await {
        Ok(key) => log::info!(
            "Export saved to {} ({} flagged)",
            key,
            export.flagged_only.len()
        ),
        Err(e) => log::error!("Failed to write export: {}", e),
    }

    let snapshot = ctx.snapshot(generated_at, records.len());
    if let Err(e) = storage.write_snapshot(&stamp, &snapshot).await {
        log::error!("Failed to save insight snapshot, skipping change report: {}", e);
        return Ok(summary);
    }

    match ChangeDetector::new().detect(storage, &snapshot).await {
        Ok(report) => {
            if !report.has_changes() {
                log::info!("No new entity additions or rule notes since the previous snapshot");
            }
            let markdown = render_report(&report, &now);
            match storage.write_report(&stamp, &markdown).await {
                Ok(key) => {
                    log::info!(
                        "Change report saved to {} ({} new items)",
                        key,
                        report.change_count()
                    );
                    summary.changes = Some(report.change_count());
                    summary.report_location = Some(key);
                }
                Err(e) => log::error!("Failed to write change report: {}", e),
            }
        }
        Err(HistoryUnavailable::InsufficientSnapshots { found }) => {
            log::info!(
                "Not enough history for a change report ({} snapshot(s)); skipping",
                found
            );
        }
        Err(e) => log::warn!("Change report skipped: {}", e),
    }

    Ok(summary)
}
