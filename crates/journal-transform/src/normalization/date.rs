//! Date normalization to ISO 8601 calendar dates.
//!
//! Accepted layouts, tried in order (first match wins):
//!
//! 1. `YYYY-MM-DD`
//! 2. `YYYY-MM-DDTHH:MM:SS`
//! 3. `YYYY-MM-DD HH:MM:SS`
//! 4. `MM/DD/YYYY` (US)
//! 5. `DD-MM-YYYY` (European)
//!
//! The year is always four digits; month, day and time fields take one or two
//! digits. Times must be valid but are dropped from the result. Anything else,
//! including `YYYY/MM/DD`, is rejected rather than guessed at.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::{Captures, Regex};

struct DatePattern {
    name: &'static str,
    regex: Regex,
}

fn pattern(name: &'static str, regex: &str) -> DatePattern {
    DatePattern {
        name,
        regex: Regex::new(regex).expect("Invalid date pattern regex"),
    }
}

static DATE_PATTERNS: LazyLock<[DatePattern; 5]> = LazyLock::new(|| {
    [
        pattern("iso-date", r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{1,2})-(?P<d>[0-9]{1,2})$"),
        pattern(
            "iso-datetime",
            r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{1,2})-(?P<d>[0-9]{1,2})T(?P<H>[0-9]{1,2}):(?P<M>[0-9]{1,2}):(?P<S>[0-9]{1,2})$",
        ),
        pattern(
            "iso-datetime-space",
            r"^(?P<y>[0-9]{4})-(?P<m>[0-9]{1,2})-(?P<d>[0-9]{1,2}) (?P<H>[0-9]{1,2}):(?P<M>[0-9]{1,2}):(?P<S>[0-9]{1,2})$",
        ),
        pattern("us", r"^(?P<m>[0-9]{1,2})/(?P<d>[0-9]{1,2})/(?P<y>[0-9]{4})$"),
        pattern("european", r"^(?P<d>[0-9]{1,2})-(?P<m>[0-9]{1,2})-(?P<y>[0-9]{4})$"),
    ]
});

/// Normalize a date in one of the accepted layouts to `YYYY-MM-DD`.
///
/// Returns `None` for empty input, unsupported layouts, and dates or times
/// that do not exist on the calendar (`2024-02-30`, `29-02-2023`).
pub fn normalize_date(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| match_pattern(pattern, trimmed))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Name of the first layout the value matches lexically, valid date or not.
pub fn detect_layout(value: &str) -> Option<&'static str> {
    let trimmed = value.trim();
    DATE_PATTERNS
        .iter()
        .find(|pattern| pattern.regex.is_match(trimmed))
        .map(|pattern| pattern.name)
}

fn match_pattern(pattern: &DatePattern, value: &str) -> Option<NaiveDate> {
    let caps = pattern.regex.captures(value)?;
    let year: i32 = field(&caps, "y")?;
    if year < 1 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, field(&caps, "m")?, field(&caps, "d")?)?;
    if caps.name("H").is_some() {
        NaiveTime::from_hms_opt(field(&caps, "H")?, field(&caps, "M")?, field(&caps, "S")?)?;
    }
    Some(date)
}

fn field<T: std::str::FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name)?.as_str().parse().ok()
}
