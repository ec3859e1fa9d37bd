// src/pipeline/report.rs

//! Markdown rendering of change reports.

use std::fmt::Write;

use chrono::{DateTime, TimeZone};

use crate::models::ChangeReport;
use crate::utils::truncate_with_ellipsis;

/// Characters of rule text shown per item.
const RULE_SUMMARY_CHARS: usize = 100;

/// Render a change report as Markdown.
pub fn render_report<Tz>(report: &ChangeReport, generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "# Export Control Changes Report\n");
    let _ = writeln!(out, "**Generated:** {}\n", generated_at.format("%Y-%m-%d %H:%M"));

    out.push_str("## New Entity Additions\n\n");
    if report.new_entities.is_empty() {
        out.push_str("*No new entity additions detected since last scan.*\n\n");
    } else {
        for (i, entity) in report.new_entities.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}**", i + 1, entity.region_or_country);
            let _ = writeln!(out, "   - [Source Document]({})\n", entity.url);
        }
    }

    out.push_str("## New Rule Notes\n\n");
    if report.new_rules.is_empty() {
        out.push_str("*No new rule notes detected since last scan.*\n\n");
    } else {
        for (i, rule) in report.new_rules.iter().enumerate() {
            let summary = truncate_with_ellipsis(&rule.rule_text, RULE_SUMMARY_CHARS);
            let _ = writeln!(out, "{}. **{}**", i + 1, summary);
            let _ = writeln!(out, "   - [Full Document]({})\n", rule.url);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityAddition, RuleNote};
    use chrono::Utc;

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_report() {
        let markdown = render_report(&ChangeReport::default(), &generated());
        assert!(markdown.starts_with("# Export Control Changes Report\n\n**Generated:** 2025-01-15 09:30\n"));
        assert!(markdown.contains("*No new entity additions detected since last scan.*"));
        assert!(markdown.contains("*No new rule notes detected since last scan.*"));
    }

    #[test]
    fn test_items_carry_urls() {
        let report = ChangeReport {
            new_entities: vec![EntityAddition {
                url: "https://a.gov/1.pdf".into(),
                region_or_country: "Russia".into(),
            }],
            new_rules: vec![RuleNote {
                url: "https://a.gov/2.pdf".into(),
                rule_text: "x".repeat(120),
            }],
        };
        let markdown = render_report(&report, &generated());

        assert!(markdown.contains("1. **Russia**\n   - [Source Document](https://a.gov/1.pdf)\n"));
        let truncated = format!("1. **{}...**", "x".repeat(100));
        assert!(markdown.contains(&truncated));
        assert!(markdown.contains("[Full Document](https://a.gov/2.pdf)"));
    }

    #[test]
    fn test_short_rule_not_truncated() {
        let report = ChangeReport {
            new_rules: vec![RuleNote {
                url: "u".into(),
                rule_text: "The rule adds items".into(),
            }],
            ..ChangeReport::default()
        };
        let markdown = render_report(&report, &generated());
        assert!(markdown.contains("1. **The rule adds items**\n"));
    }
}
