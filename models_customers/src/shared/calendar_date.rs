//! Canonical calendar date parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses user supplied date input into a calendar date, discarding any time of day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (normalized to the UTC date) and
/// naive `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }

    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}
