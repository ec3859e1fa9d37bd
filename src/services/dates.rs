// src/services/dates.rs

//! Publication date normalization.
//!
//! Scraped dates arrive in whatever shape the feed happens to use. Exact
//! formats are tried first, in order; the first one that consumes the whole
//! string wins. If none does, a few loose patterns are searched for anywhere
//! in the text.

use std::sync::LazyLock;

use chrono::{NaiveDate, Weekday};
use regex::Regex;

use crate::error::DateUnparsed;

/// Exact formats tried after the weekday form, in order.
const EXACT_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%B %d, %Y",
    "%Y-%m-%d",
    "%d %B %Y",
    "%B %d %Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

/// `M/D/YY` or `M-D-YYYY`, month first.
static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})").expect("numeric date pattern")
});

/// `<month> D, YYYY` where the month is a name or a number.
static WORDED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\s+(\d{1,2}),?\s+(\d{4})").expect("worded date pattern")
});

/// Convert raw date text to a calendar date.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use regulus::services::normalize_date;
///
/// assert_eq!(
///     normalize_date("January 15, 2025"),
///     Ok(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
/// );
/// assert!(normalize_date("").is_err());
/// ```
pub fn normalize_date(raw: &str) -> Result<NaiveDate, DateUnparsed> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DateUnparsed(raw.to_string()));
    }

    parse_exact(text)
        .or_else(|| parse_numeric(text))
        .or_else(|| parse_worded(text))
        .ok_or_else(|| DateUnparsed(raw.to_string()))
}

fn parse_exact(text: &str) -> Option<NaiveDate> {
    parse_weekday_form(text).or_else(|| {
        EXACT_FORMATS
            .iter()
            .filter(|fmt| !fmt.contains("%B") || names_full_month(text))
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    })
}

/// chrono's `%B` also accepts `Jan`; only full month names count here.
fn names_full_month(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .all(|word| month_number(word).is_some())
}

/// `Monday, 06 January 2025`. The weekday name is required but not checked
/// against the date.
fn parse_weekday_form(text: &str) -> Option<NaiveDate> {
    let (day_name, rest) = text.split_once(", ")?;
    day_name.parse::<Weekday>().ok()?;
    let rest = rest.trim();
    if !names_full_month(rest) {
        return None;
    }
    NaiveDate::parse_from_str(rest, "%d %B %Y").ok()
}

fn parse_numeric(text: &str) -> Option<NaiveDate> {
    let caps = NUMERIC_DATE.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_worded(text: &str) -> Option<NaiveDate> {
    let caps = WORDED_DATE.captures(text)?;
    let word = &caps[1];
    let month = if word.chars().all(|c| c.is_ascii_digit()) {
        word.parse().ok()?
    } else {
        month_number(word)?
    };
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Full English month name, any case.
fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_ascii_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(month)
}
