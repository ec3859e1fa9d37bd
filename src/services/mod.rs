//! Service layer for the scanner.
//!
//! This module contains the per-notice processing steps:
//! - Feed adapters (`NoticeSource`)
//! - Date normalization (`normalize_date`)
//! - Document download (`DocumentAcquirer`)
//! - Text extraction (`extract_text`, `extract_text_within`)
//! - Classification code scanning (`scan_codes`)
//! - Risk keyword flagging (`KeywordFlagger`)
//! - Insight extraction (`extract_insights`)

mod acquire;
mod codes;
mod dates;
mod extract;
pub mod flags;
mod insights;
mod sources;

pub use acquire::DocumentAcquirer;
pub use codes::scan_codes;
pub use dates::normalize_date;
pub use extract::{extract_text, extract_text_within};
pub use flags::{DEFAULT_KEYWORDS, KeywordFlagger};
pub use insights::extract_insights;
pub use sources::{FederalRegisterTable, FileSource, NoticeSource};
