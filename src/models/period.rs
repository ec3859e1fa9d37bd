//! Quarterly ledger partitioning.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// A calendar quarter; each quarter has its own ledger partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerPeriod {
    pub year: i32,
    /// 1..=4
    pub quarter: u32,
}

impl LedgerPeriod {
    /// The quarter a date falls in.
    pub fn containing(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }

    /// Partition label, e.g. `2025_Q1`.
    pub fn label(&self) -> String {
        format!("{}_Q{}", self.year, self.quarter)
    }
}

impl fmt::Display for LedgerPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
