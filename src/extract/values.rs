//! Parsers for the loosely formatted values found on event pages

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("price pattern compiles"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}:\d{2})").expect("time pattern compiles"));

/// Parses the first decimal-looking number out of a price label
///
/// Every comma is stripped first, so `1,250` reads as 1250. A decimal comma
/// (`12,50`) is read the same way and yields 1250.
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped = text.replace(',', "");
    let found = PRICE_PATTERN.find(&stripped)?;
    found.as_str().parse::<f64>().ok()
}

/// Detects the currency named by a price label
pub fn detect_currency(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    if text.contains('€') || upper.contains("EUR") {
        Some("EUR")
    } else if text.contains('£') || upper.contains("GBP") {
        Some("GBP")
    } else if text.contains('$') || upper.contains("USD") {
        Some("USD")
    } else {
        None
    }
}

/// Returns every `H:MM`/`HH:MM` time in the text, in order
pub fn parse_times(text: &str) -> Vec<NaiveTime> {
    TIME_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| NaiveTime::parse_from_str(m.as_str(), "%H:%M").ok())
        .collect()
}

/// Parses an ISO date or datetime into its date and optional time parts
///
/// Accepts RFC 3339 with offset, naive datetimes with or without seconds,
/// and bare dates.
pub fn parse_iso_datetime(text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let text = text.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        let naive = dt.naive_local();
        return Some((naive.date(), Some(naive.time())));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some((naive.date(), Some(naive.time())));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| (date, None))
}

/// Parses the human-readable date labels used on listing sites
///
/// Supported shapes: ISO `YYYY-MM-DD`, `DD/MM/YYYY`, `D Month YYYY`
/// (full or abbreviated month, optional weekday prefix), and the compact
/// `SatDDMon` form, which carries no year and is read in the current year.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some((date, _)) = parse_iso_datetime(text) {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Some(date);
    }

    let without_weekday = strip_weekday_prefix(text);
    for format in ["%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y"] {
        let cleaned = without_weekday.replace(',', "");
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }

    parse_compact_date(text, Utc::now().year())
}

/// Parses `SatDDMon` / `Sat DD Mon` in the given year
pub fn parse_compact_date(text: &str, year: i32) -> Option<NaiveDate> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let with_year = format!("{}{}", compact, year);
    NaiveDate::parse_from_str(&with_year, "%a%d%b%Y").ok()
}

fn strip_weekday_prefix(text: &str) -> &str {
    match text.split_once(' ') {
        Some((first, rest))
            if first.trim_end_matches(',').chars().all(char::is_alphabetic)
                && rest.starts_with(|c: char| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => text,
    }
}
