//! Locale-aware scalar parsing
//!
//! Every parser here returns a safe default instead of an error: a bad cell
//! must never abort the row it belongs to.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Input format of order dates in both the upstream and the CSV export.
pub const ORDER_DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a number that may carry `,` thousands separators (e.g. `46,565.11`).
///
/// Surrounding whitespace and quote characters are ignored. Empty input,
/// garbage and non-finite results all yield `0.0`.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != ',')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// `parse_number` rounded half-to-even.
pub fn parse_integer(raw: &str) -> i64 {
    round_to_integer(parse_number(raw))
}

pub fn round_to_integer(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// A single fallible date parse attempt.
pub type DateStrategy = fn(&str) -> Option<NaiveDate>;

/// Only the fixed `DD.MM.YYYY` export format.
pub const STRICT_DATE: &[DateStrategy] = &[dotted_date];

/// The strict format first, then the broader formats seen from the upstream.
pub const LENIENT_DATE: &[DateStrategy] = &[
    dotted_date,
    rfc3339_timestamp,
    iso_datetime,
    iso_space_datetime,
    iso_date,
    slashed_iso_date,
    slashed_day_first,
    dashed_day_first,
    dotted_datetime,
];

/// Try each strategy in order; the first success wins.
pub fn parse_date_with(raw: &str, strategies: &[DateStrategy]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    strategies.iter().find_map(|parse| parse(raw))
}

/// Strict `DD.MM.YYYY` parse. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_date_with(raw, STRICT_DATE)
}

/// Strict parse first, then the looser upstream formats.
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    parse_date_with(raw, LENIENT_DATE)
}

fn dotted_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, ORDER_DATE_FORMAT).ok()
}

fn rfc3339_timestamp(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn iso_datetime(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn iso_space_datetime(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn slashed_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y/%m/%d").ok()
}

fn slashed_day_first(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

fn dashed_day_first(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%d-%m-%Y").ok()
}

fn dotted_datetime(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%d.%m.%Y %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // -------------------------------------------------------------------------
    // NUMBERS
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_number_thousands_separator() {
        assert_eq!(parse_number("46,565.11"), 46565.11);
        assert_eq!(parse_number("1,000"), 1000.0);
        assert_eq!(parse_number("1,234,567"), 1234567.0);
    }

    #[test]
    fn test_parse_number_quotes_and_whitespace() {
        assert_eq!(parse_number("  \"12.5\"  "), 12.5);
        assert_eq!(parse_number("\"1,200\""), 1200.0);
    }

    #[test]
    fn test_parse_number_failures_default_to_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("   "), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("12abc"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn test_parse_number_negative() {
        assert_eq!(parse_number("-1,500.25"), -1500.25);
    }

    #[test]
    fn test_parse_integer_rounds() {
        assert_eq!(parse_integer("1,000"), 1000);
        assert_eq!(parse_integer("399.6"), 400);
        assert_eq!(parse_integer("2.5"), 2);
        assert_eq!(parse_integer("3.5"), 4);
        assert_eq!(parse_integer("x"), 0);
    }

    // -------------------------------------------------------------------------
    // DATES
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_date_strict_format() {
        assert_eq!(parse_date("18.08.2025"), Some(ymd(2025, 8, 18)));
        assert_eq!(parse_date(" 01.01.2024 "), Some(ymd(2024, 1, 1)));
    }

    #[test]
    fn test_parse_date_non_matching_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("TOPLAM"), None);
        assert_eq!(parse_date("2025-08-18"), None);
        assert_eq!(parse_date("32.01.2025"), None);
        assert_eq!(parse_date("18/08/2025"), None);
    }

    #[test]
    fn test_parse_date_lenient_tries_strict_first() {
        // 03.04.2025 must stay day-first
        assert_eq!(parse_date_lenient("03.04.2025"), Some(ymd(2025, 4, 3)));
    }

    #[test]
    fn test_parse_date_lenient_upstream_formats() {
        let expected = Some(ymd(2025, 8, 18));
        assert_eq!(parse_date_lenient("2025-08-18T00:00:00"), expected);
        assert_eq!(parse_date_lenient("2025-08-18T10:15:30.123"), expected);
        assert_eq!(parse_date_lenient("2025-08-18T10:15:30+03:00"), expected);
        assert_eq!(parse_date_lenient("2025-08-18 10:15:30"), expected);
        assert_eq!(parse_date_lenient("2025-08-18"), expected);
        assert_eq!(parse_date_lenient("2025/08/18"), expected);
        assert_eq!(parse_date_lenient("18/08/2025"), expected);
        assert_eq!(parse_date_lenient("18-08-2025"), expected);
        assert_eq!(parse_date_lenient("18.08.2025 00:00:00"), expected);
    }

    #[test]
    fn test_parse_date_lenient_garbage_is_none() {
        assert_eq!(parse_date_lenient("Genel Toplam"), None);
        assert_eq!(parse_date_lenient(""), None);
    }
}
