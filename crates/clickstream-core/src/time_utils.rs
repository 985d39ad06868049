use chrono::{DateTime, NaiveDateTime};

use crate::error::{ClickstreamError, Result};

/// Naive formats tried after the zone-aware ones, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

// ── Event timestamps ──────────────────────────────────────────────────────────

/// Parse an `event_time` cell into a timezone-naive UTC instant.
///
/// The log writes `2019-10-01 00:00:04 UTC`; numeric offsets
/// (`+02:00`, `+0200`), RFC 3339 and plain naive timestamps are accepted as
/// well. Zone-aware values are converted to UTC before the zone is dropped.
pub fn parse_event_time(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ClickstreamError::TimestampParse(raw.to_string()));
    }

    if let Some(stripped) = s.strip_suffix(" UTC").or_else(|| s.strip_suffix('Z')) {
        return parse_naive(stripped).ok_or_else(|| ClickstreamError::TimestampParse(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.naive_utc());
    }

    parse_naive(s).ok_or_else(|| ClickstreamError::TimestampParse(raw.to_string()))
}

/// Elapsed seconds from `start` to `end`; negative when `end` is earlier.
pub fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    delta.num_milliseconds() as f64 / 1_000.0
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
