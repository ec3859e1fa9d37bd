//! Structured insights pulled out of notice documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A region or country named in an Entity List addition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityAddition {
    /// Originating document URL
    pub url: String,
    pub region_or_country: String,
}

/// A sentence describing what a rule does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleNote {
    /// Originating document URL
    pub url: String,
    pub rule_text: String,
}

/// One item found by pattern extraction over a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedInsight {
    EntityAddition(EntityAddition),
    RuleNote(RuleNote),
}

/// The insights of one run, persisted as the baseline for the next run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InsightSnapshot {
    pub generated_at: DateTime<Utc>,
    pub notice_count: usize,
    #[serde(default)]
    pub entity_additions: Vec<EntityAddition>,
    #[serde(default)]
    pub rule_notes: Vec<RuleNote>,
}

/// Items that are new since the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    pub new_entities: Vec<EntityAddition>,
    pub new_rules: Vec<RuleNote>,
}

impl ChangeReport {
    /// Check if there are any new items.
    pub fn has_changes(&self) -> bool {
        !self.new_entities.is_empty() || !self.new_rules.is_empty()
    }

    /// Get the total number of new items.
    pub fn change_count(&self) -> usize {
        self.new_entities.len() + self.new_rules.len()
    }
}
