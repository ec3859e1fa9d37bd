// src/pipeline/enrich.rs

//! Per-notice enrichment.
//!
//! Each raw notice passes through date normalization, document acquisition,
//! text extraction, code scanning and keyword flagging. Failures in any step
//! are logged and recorded on the [`RunContext`]; they never stop the batch.

use chrono::{DateTime, Utc};

use crate::models::{
    EntityAddition, ExtractedInsight, InsightSnapshot, NoticeRecord, RawNotice, RuleNote,
};
use crate::services::{
    DocumentAcquirer, KeywordFlagger, extract_insights, extract_text_within, normalize_date,
    scan_codes,
};

/// Log line for flagged notices.
const FLAGGED_TEMPLATE: &str = "[{date}] {title} ({keywords})";

/// Per-run counters for record-local failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub documents_downloaded: usize,
    pub acquisition_failures: usize,
    pub extraction_failures: usize,
    pub unparsed_dates: usize,
}

/// State accumulated over one run. Created fresh for every run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub entity_additions: Vec<EntityAddition>,
    pub rule_notes: Vec<RuleNote>,
    pub stats: EnrichStats,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's insights.
    pub fn absorb(&mut self, insights: Vec<ExtractedInsight>) {
        for insight in insights {
            match insight {
                ExtractedInsight::EntityAddition(e) => self.entity_additions.push(e),
                ExtractedInsight::RuleNote(r) => self.rule_notes.push(r),
            }
        }
    }

    /// Freeze the accumulated insights into a snapshot.
    pub fn snapshot(&self, generated_at: DateTime<Utc>, notice_count: usize) -> InsightSnapshot {
        InsightSnapshot {
            generated_at,
            notice_count,
            entity_additions: self.entity_additions.clone(),
            rule_notes: self.rule_notes.clone(),
        }
    }
}

/// Runs the per-notice steps.
pub struct Enricher {
    acquirer: DocumentAcquirer,
    flagger: KeywordFlagger,
}

impl Enricher {
    pub fn new(acquirer: DocumentAcquirer, flagger: KeywordFlagger) -> Self {
        Self { acquirer, flagger }
    }

    /// Enrich a batch in feed order.
    pub async fn enrich_all(&self, batch: Vec<RawNotice>, ctx: &mut RunContext) -> Vec<NoticeRecord> {
        let total = batch.len();
        let mut records = Vec::with_capacity(total);
        for (i, raw) in batch.into_iter().enumerate() {
            log::debug!("[{}/{}] {}", i + 1, total, raw.title);
            records.push(self.enrich(raw, ctx).await);
        }
        records
    }

    /// Enrich one notice.
    pub async fn enrich(&self, raw: RawNotice, ctx: &mut RunContext) -> NoticeRecord {
        let mut record = NoticeRecord::from_raw(raw);

        match normalize_date(&record.publication_date_raw) {
            Ok(date) => record.publication_date = Some(date),
            Err(e) => {
                log::warn!("[date] {}: {}", record.url, e);
                ctx.stats.unparsed_dates += 1;
            }
        }

        if record.url.trim().is_empty() {
            log::warn!("[acquire] no document link for '{}'", record.title);
        } else {
            match self.acquirer.acquire(&record.url).await {
                Ok(path) => {
                    record.document_downloaded = true;
                    record.document_path = Some(path.display().to_string());
                    ctx.stats.documents_downloaded += 1;
                    self.scan_document(&mut record, &path, ctx).await;
                }
                Err(e) => {
                    log::warn!("[acquire:{}] {}: {}", e.kind(), record.url, e);
                    ctx.stats.acquisition_failures += 1;
                }
            }
        }

        self.flagger.flag(&mut record);
        if record.flagged {
            log::info!("Flagged: {}", record.format(FLAGGED_TEMPLATE));
        }
        record
    }

    async fn scan_document(
        &self,
        record: &mut NoticeRecord,
        path: &std::path::Path,
        ctx: &mut RunContext,
    ) {
        let timeout = self.acquirer.config().extraction_timeout();
        match extract_text_within(path, timeout).await {
            Ok(text) => {
                record.set_codes(scan_codes(&text));
                ctx.absorb(extract_insights(&text, &record.url));
                if record.contains_code {
                    log::info!("{} code(s) in {}", record.code_count, record.url);
                }
            }
            Err(e) => {
                log::warn!("[extract] {}: {}", record.url, e);
                ctx.stats.extraction_failures += 1;
            }
        }
    }
}

/// Newest publication date first; undated records last, in feed order.
pub fn sort_newest_first(records: &mut [NoticeRecord]) {
    records.sort_by(|a, b| match (a.publication_date, b.publication_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
