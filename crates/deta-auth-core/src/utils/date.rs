// Date parsing for attributes stored as ISO-8601 strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parse an ISO-8601 date string.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00.000Z`, `...+02:00`), a datetime
/// without offset (read as UTC) and a bare date (midnight UTC).
pub fn parse_iso_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical at-rest form of a date: RFC 3339, UTC, `Z` suffix.
pub fn format_iso_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
