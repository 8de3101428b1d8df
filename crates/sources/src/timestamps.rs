//! Timestamp parsing with a "now" fallback.
//!
//! A single malformed timestamp must not abort a whole feed, so
//! [`coerce_timestamp`] substitutes the supplied "now" and logs the
//! substitution instead of failing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use festflow_core::types::Timestamp;

/// A parsed instant plus the UTC offset (minutes) it was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub utc: Timestamp,
    pub offset_minutes: i32,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse RFC 3339 (with `T` or a space), `+HHMM` offsets, or a naive
/// date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<ParsedTimestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let with_t = raw.replacen(' ', "T", 1);
    let aware = DateTime::parse_from_rfc3339(&with_t)
        .or_else(|_| DateTime::parse_from_str(&with_t, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(&with_t, "%Y-%m-%dT%H:%M:%S%.f%z"));
    if let Ok(dt) = aware {
        return Some(ParsedTimestamp {
            utc: dt.with_timezone(&Utc),
            offset_minutes: dt.offset().local_minus_utc() / 60,
        });
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| ParsedTimestamp {
            utc: Utc.from_utc_datetime(&naive),
            offset_minutes: 0,
        })
}

/// Parse `raw`, falling back to `now` (offset 0) when it is missing or
/// unparseable.
pub fn coerce_timestamp(raw: Option<&str>, now: Timestamp, context: &str) -> ParsedTimestamp {
    match raw.and_then(parse_timestamp) {
        Some(parsed) => parsed,
        None => {
            tracing::warn!(
                raw = raw.unwrap_or("<missing>"),
                context,
                substituted = %now,
                "Unparseable performance timestamp, substituting current time",
            );
            ParsedTimestamp {
                utc: now,
                offset_minutes: 0,
            }
        }
    }
}

/// Parse a window bound: a full timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_bound(raw: &str) -> Option<Timestamp> {
    parse_timestamp(raw).map(|p| p.utc).or_else(|| {
        chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}
