// src/models/mod.rs

//! Domain models for the scanner.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod insight;
mod notice;
mod period;

// Re-export all public types
pub use config::{AcquisitionConfig, Config, FlaggingConfig, HttpConfig, SourceConfig};
pub use insight::{ChangeReport, EntityAddition, ExtractedInsight, InsightSnapshot, RuleNote};
pub use notice::{LedgerRow, NoticeRecord, RawNotice};
pub use period::LedgerPeriod;
