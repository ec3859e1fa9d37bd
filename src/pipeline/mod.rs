//! Pipeline stages and the scan entry point.
//!
//! - `run_scan`: Fetch, enrich, merge and report in one run
//! - `LedgerMerger`: Quarterly ledger persistence
//! - `ChangeDetector`: New insights since the previous run

pub mod diff;
pub mod enrich;
pub mod export;
pub mod merge;
pub mod report;
pub mod scan;

pub use diff::ChangeDetector;
pub use enrich::{EnrichStats, Enricher, RunContext};
pub use export::ExportWorkbook;
pub use merge::{LedgerMerger, MergeOutcome};
pub use report::render_report;
pub use scan::{RunOutcome, RunSummary, run_scan};
