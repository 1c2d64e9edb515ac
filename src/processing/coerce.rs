//! Best-effort value coercion.
//!
//! Nothing in here fails: a cell that cannot be read as a number or date yields `None` and the
//! caller decides what that means (excluded from an aggregate, counted as "not a date", ...).

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::types::Value;

/// Strings that look like a date at all: a four digit year or `d/m`, `m-d` style pairs.
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}|\d{1,2}[/-]\d{1,2}").expect("static regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Two-digit years go first: chrono's `%Y` also accepts a single digit, so "1/5/24" would
// otherwise parse as year 1.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m-%d-%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Convert a cell to a number.
///
/// - [`Value::Number`] passes through (`NaN` counts as "not a number")
/// - [`Value::Text`] has `$`, `%` and `,` removed and its leading float prefix parsed
/// - everything else is `None`
///
/// ```rust
/// use tabular_ingest::processing::to_number;
/// use tabular_ingest::types::Value;
///
/// assert_eq!(to_number(&Value::from("$1,234.50")), Some(1234.5));
/// assert_eq!(to_number(&Value::from("abc")), None);
/// ```
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_nan() => None,
        Value::Number(n) => Some(*n),
        Value::Text(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | '%' | ',')).collect();
            parse_float_prefix(&cleaned)
        }
        _ => None,
    }
}

/// Parse the longest leading float literal of `s`, skipping leading whitespace.
///
/// Accepts an optional sign, digits with an optional fraction, an optional exponent, and
/// `Infinity`. Trailing garbage is ignored (`"12px"` is `12`); no digits at all is `None`.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let inf = f64::INFINITY;
        return Some(if bytes.first() == Some(&b'-') { -inf } else { inf });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// `true` for literal booleans and the strings `"true"` / `"false"`.
pub fn is_boolean_like(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Text(s) => s == "true" || s == "false",
        _ => false,
    }
}

/// `true` for numbers and strings whose leading float prefix, once commas are removed, is finite.
///
/// Same prefix rule as [`to_number`], so `"12px"` and `"2024-01-05"` count as numbers.
pub fn is_number_like(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::Text(s) => parse_float_prefix(&s.replace(',', "")).is_some_and(f64::is_finite),
        _ => false,
    }
}

/// `true` for dates and strings that both look like a date and parse as one.
pub fn is_date_like(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Text(s) => DATE_SHAPE.is_match(s) && parse_date(s).is_some(),
        _ => false,
    }
}

/// Best-effort date parser for free-form cell text.
///
/// Accepts RFC 3339 timestamps (converted to UTC), common ISO/US date and date-time layouts,
/// long month names, `YYYY-MM` and a bare `YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    year_month(s)
}

fn year_month(s: &str) -> Option<NaiveDateTime> {
    let (year, month) = match s.split_once('-') {
        Some((y, m)) => (y, m),
        None => (s, "1"),
    };
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?.and_hms_opt(0, 0, 0)
}
