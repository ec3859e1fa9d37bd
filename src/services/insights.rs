// src/services/insights.rs

//! Pattern extraction of Entity List additions and rule descriptions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{EntityAddition, ExtractedInsight, RuleNote};

/// Capture group 1 is the region or country.
static ENTITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(?:added|adding|placed)(?:\s+\w+){0,6}\s+to the Entity List[^.]*?(?:in|from|for)\s+([^,\n.]+)",
        r"(?i)Entity List[^.]*?(?:in|from|for)\s+([^,\n.]+)",
        r"(?i)(?:added|adding|placed)(?:\s+\w+){0,6}\s+to[^.]*?(?:Entity List)[^.]*?(?:in|from|for)\s+([^,\n.]+)",
    ])
});

/// The whole match is the note.
static RULE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?is)(?:This|The) (?:final|interim final) rule (?:makes|revises|amends|modifies)[^.]+",
        r"(?is)(?:This|The) rule (?:implements|establishes|removes|adds)[^.]+",
        r"(?is)Purpose of (?:this|the) rule:[^.]+",
        r"(?is)SUMMARY:[^\n]+(?:final rule)[^\n]+",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("insight pattern"))
        .collect()
}

/// Extract insights from one document's text.
///
/// Within a document each distinct entity text and rule text is reported
/// once, in pattern order. Nothing is deduplicated across documents.
pub fn extract_insights(text: &str, url: &str) -> Vec<ExtractedInsight> {
    let mut insights = Vec::new();

    let mut seen_entities = HashSet::new();
    for pattern in ENTITY_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(region) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if !region.is_empty() && seen_entities.insert(region.to_string()) {
                insights.push(ExtractedInsight::EntityAddition(EntityAddition {
                    url: url.to_string(),
                    region_or_country: region.to_string(),
                }));
            }
        }
    }

    let mut seen_rules = HashSet::new();
    for pattern in RULE_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            let rule = m.as_str().trim();
            if !rule.is_empty() && seen_rules.insert(rule.to_string()) {
                insights.push(ExtractedInsight::RuleNote(RuleNote {
                    url: url.to_string(),
                    rule_text: rule.to_string(),
                }));
            }
        }
    }

    insights
}
