// src/pipeline/export.rs

//! Tabular export of a ledger partition.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{LedgerPeriod, NoticeRecord};

/// Static reference notes shipped with every export.
pub const GUIDANCE: &[&str] = &[
    "ECCN 3A090.a Tracking Guidance",
    "1. Monitor the Federal Register for new and amended ECCNs such as 3A090.a. For example: https://www.federalregister.gov/documents/2025/01/15/2025-00636/framework-for-artificial-intelligence-diffusion.",
    "2. BIS occasionally posts summary pages related to AI export policy and license diffusion (e.g., bis.gov/AI-diffusion), but the Federal Register is the authoritative source.",
    "3. Full ECCN definitions live in Supplement No. 1 to Part 774 of the EAR. For licensing notes (like Note 1), refer to § 742.6(a)(6)(iii)(A).",
    "4. Consider using the Federal Register API or scanning documents for phrases like '3A090', 'final rule', or 'model weights' to detect new AI-related controls.",
    "",
    "Note: ECCN 3A090.a controls are often associated with AI chipsets and model weights for closed-weight dual-use AI systems. These rules are updated via interim final rules and are time-sensitive.",
];

/// One row of the title/date/link summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRow {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub url: String,
}

/// Total codes found per raw publication date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeCountRow {
    pub publication_date: String,
    pub total_codes: usize,
}

/// All export tables for one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportWorkbook {
    pub generated_at: DateTime<Utc>,
    pub period: LedgerPeriod,
    pub all_entries: Vec<NoticeRecord>,
    pub flagged_only: Vec<NoticeRecord>,
    pub summary: Vec<SummaryRow>,
    pub guidance: Vec<String>,
    /// Aggregated over this run's batch, not the whole partition
    pub code_summary: Vec<CodeCountRow>,
}

impl ExportWorkbook {
    /// Build the tables from the merged partition and this run's batch.
    pub fn build(
        period: LedgerPeriod,
        ledger: &[NoticeRecord],
        batch: &[NoticeRecord],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let flagged_only = ledger.iter().filter(|r| r.flagged).cloned().collect();

        let summary = ledger
            .iter()
            .map(|r| SummaryRow {
                title: r.title.clone(),
                date: r.publication_date,
                url: r.url.clone(),
            })
            .collect();

        Self {
            generated_at,
            period,
            all_entries: ledger.to_vec(),
            flagged_only,
            summary,
            guidance: GUIDANCE.iter().map(|line| line.to_string()).collect(),
            code_summary: code_counts(batch),
        }
    }
}

/// Sum `code_count` per raw publication date, ordered by that text.
fn code_counts(records: &[NoticeRecord]) -> Vec<CodeCountRow> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *totals.entry(record.publication_date_raw.as_str()).or_default() += record.code_count;
    }
    totals
        .into_iter()
        .map(|(date, total)| CodeCountRow {
            publication_date: date.to_string(),
            total_codes: total,
        })
        .collect()
}
