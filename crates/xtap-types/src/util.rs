use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Creation timestamp format used by the platform (`Wed Oct 10 20:19:24 +0000 2018`)
pub const PLATFORM_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Format a capture timestamp for storage.
///
/// Fixed-width RFC 3339 in UTC with microseconds, so lexical order in SQLite
/// equals chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp back to UTC.
///
/// Accepts RFC 3339 as well as SQLite's `CURRENT_TIMESTAMP` layout
/// (`2025-01-01 10:00:00`), which older capture databases contain.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a platform-native creation timestamp
pub fn parse_platform_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(ts.trim(), PLATFORM_TIME_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Round to one decimal place for presentation
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Truncate a string to a maximum length
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect::<String>() + "..."
    }
}
