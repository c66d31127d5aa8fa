//! Timestamp decoding for ledger and trigger records.
//!
//! Accepted forms, tried in order:
//! - RFC 3339 (`2026-03-01T08:00:00Z`, `2026-03-01T08:00:00+02:00`)
//! - naive date-time read as UTC (`2026-03-01T08:00:00`, `2026-03-01 08:00:00`)
//! - bare date read as UTC midnight (`2026-03-01`)
//! - JSON numbers as epoch milliseconds

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp string into epoch milliseconds.
#[must_use]
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

/// Decode a JSON timestamp (string or epoch-millisecond number).
#[must_use]
pub fn value_to_ms(value: &Value) -> Option<i64> {
    match value {
        Value::String(raw) => parse_timestamp_ms(raw),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    }
}

/// Render epoch milliseconds as an RFC 3339 UTC string.
#[must_use]
pub fn format_ms(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
