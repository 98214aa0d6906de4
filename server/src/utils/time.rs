//! Time utility functions

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// ClickHouse `DateTime` literal format
const CLICKHOUSE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an ISO 8601 / RFC 3339 timestamp into its wall-clock date-time.
///
/// Accepts RFC 3339 with a zone designator, `YYYY-MM-DD[T| ]hh:mm:ss[.fff]`
/// without one, and a bare `YYYY-MM-DD` (read as midnight). Any zone offset
/// is dropped without conversion. Impossible dates and trailing input are
/// rejected.
pub fn parse_iso_timestamp(input: &str) -> Option<NaiveDateTime> {
    let ts = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(ts, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Normalize an ISO 8601 timestamp to ClickHouse `DateTime` literal form.
///
/// `2024-01-15T10:30:00.123Z` and `2024-01-15T10:30:00+02:00` both become
/// `2024-01-15 10:30:00`. Input that does not parse is returned trimmed.
pub fn normalize_datetime(input: &str) -> String {
    match parse_iso_timestamp(input) {
        Some(dt) => dt.format(CLICKHOUSE_DATETIME).to_string(),
        None => input.trim().to_string(),
    }
}

/// Whether a string is a valid ISO 8601 date or date-time
pub fn is_iso_datetime(input: &str) -> bool {
    parse_iso_timestamp(input).is_some()
}
