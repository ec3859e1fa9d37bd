//! Change detection between insight snapshots.
//!
//! Compares this run's insights with the previous run's snapshot and keeps
//! only the items that were not seen before.
//!
//! Entities are compared by exact `region_or_country`. Rule notes are
//! compared by their first characters only, which tolerates trailing drift
//! between re-scrapes of the same document. Two different rules sharing a
//! prefix count as one.

use std::collections::HashSet;

use crate::error::HistoryUnavailable;
use crate::models::{ChangeReport, InsightSnapshot};
use crate::storage::LedgerStorage;
use crate::utils::prefix_chars;

/// Characters of rule text compared between snapshots.
pub const RULE_PREFIX_CHARS: usize = 50;

/// Calculator for new items between snapshots.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    rule_prefix_chars: usize,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self {
            rule_prefix_chars: RULE_PREFIX_CHARS,
        }
    }

    /// Items in `current` that are absent from `previous`.
    pub fn compare(&self, previous: &InsightSnapshot, current: &InsightSnapshot) -> ChangeReport {
        let seen_regions: HashSet<&str> = previous
            .entity_additions
            .iter()
            .map(|e| e.region_or_country.as_str())
            .collect();

        let seen_rules: HashSet<&str> = previous
            .rule_notes
            .iter()
            .map(|r| prefix_chars(&r.rule_text, self.rule_prefix_chars))
            .collect();

        let new_entities = current
            .entity_additions
            .iter()
            .filter(|e| !seen_regions.contains(e.region_or_country.as_str()))
            .cloned()
            .collect();

        let new_rules = current
            .rule_notes
            .iter()
            .filter(|r| !seen_rules.contains(prefix_chars(&r.rule_text, self.rule_prefix_chars)))
            .cloned()
            .collect();

        ChangeReport {
            new_entities,
            new_rules,
        }
    }

    /// Compare `current` with the snapshot persisted before it.
    ///
    /// `current` must already be stored, so at least two snapshots have to
    /// exist. The second newest is the previous run.
    pub async fn detect(
        &self,
        storage: &dyn LedgerStorage,
        current: &InsightSnapshot,
    ) -> Result<ChangeReport, HistoryUnavailable> {
        let keys = storage.list_snapshots().await.map_err(|e| {
            HistoryUnavailable::UnreadableSnapshot {
                key: "insights/".to_string(),
                message: e.to_string(),
            }
        })?;

        if keys.len() < 2 {
            return Err(HistoryUnavailable::InsufficientSnapshots { found: keys.len() });
        }

        let previous_key = &keys[keys.len() - 2];
        log::info!("Comparing with previous snapshot: {}", previous_key);

        let previous = storage.load_snapshot(previous_key).await.map_err(|e| {
            HistoryUnavailable::UnreadableSnapshot {
                key: previous_key.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(self.compare(&previous, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityAddition, RuleNote};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn snapshot(regions: &[&str], rules: &[&str]) -> InsightSnapshot {
        InsightSnapshot {
            entity_additions: regions
                .iter()
                .map(|r| EntityAddition {
                    url: "https://a.gov/1.pdf".into(),
                    region_or_country: r.to_string(),
                })
                .collect(),
            rule_notes: rules
                .iter()
                .map(|r| RuleNote {
                    url: "https://a.gov/1.pdf".into(),
                    rule_text: r.to_string(),
                })
                .collect(),
            ..InsightSnapshot::default()
        }
    }

    #[test]
    fn test_only_new_regions_reported() {
        let previous = snapshot(&["China"], &[]);
        let current = snapshot(&["China", "Russia"], &[]);

        let report = ChangeDetector::new().compare(&previous, &current);
        let regions: Vec<&str> = report
            .new_entities
            .iter()
            .map(|e| e.region_or_country.as_str())
            .collect();
        assert_eq!(regions, vec!["Russia"]);
        assert!(report.new_rules.is_empty());
    }

    #[test]
    fn test_rule_prefix_heuristic() {
        let shared = "This final rule amends the Export Administration R";
        assert_eq!(shared.chars().count(), 50);
        let old_rule = format!("{shared}egulations to add entities");
        let drifted_rule = format!("{shared}egulations, revised");
        let previous = snapshot(&[], &[old_rule.as_str()]);
        let current = snapshot(
            &[],
            &[
                // Same first 50 characters, different tail: treated as seen.
                drifted_rule.as_str(),
                "The rule establishes a new license exception",
            ],
        );

        let report = ChangeDetector::new().compare(&previous, &current);
        assert_eq!(report.new_rules.len(), 1);
        assert_eq!(
            report.new_rules[0].rule_text,
            "The rule establishes a new license exception"
        );
    }

    #[test]
    fn test_empty_previous_reports_everything() {
        let current = snapshot(&["China"], &["The rule adds items"]);
        let report = ChangeDetector::new().compare(&InsightSnapshot::default(), &current);
        assert_eq!(report.change_count(), 2);
    }

    #[tokio::test]
    async fn test_single_snapshot_is_insufficient() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let current = snapshot(&["China"], &[]);
        storage
            .write_snapshot("2025-01-15_09-00-00", &current)
            .await
            .unwrap();

        let err = ChangeDetector::new()
            .detect(&storage, &current)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryUnavailable::InsufficientSnapshots { found: 1 }
        ));
    }

    #[tokio::test]
    async fn test_detect_uses_second_newest() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .write_snapshot("2025-01-01_09-00-00", &snapshot(&["Iran"], &[]))
            .await
            .unwrap();
        storage
            .write_snapshot("2025-01-08_09-00-00", &snapshot(&["China"], &[]))
            .await
            .unwrap();
        let current = snapshot(&["China", "Iran"], &[]);
        storage
            .write_snapshot("2025-01-15_09-00-00", &current)
            .await
            .unwrap();

        let report = ChangeDetector::new().detect(&storage, &current).await.unwrap();
        assert_eq!(report.new_entities.len(), 1);
        assert_eq!(report.new_entities[0].region_or_country, "Iran");
    }
}
