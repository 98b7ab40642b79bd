//! ISO-8601 timestamp handling

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Parse a snapshot timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, `2024-01-01T00:00:00+02:00`) and
/// offset-less `2024-01-01T00:00:00[.fff]`, which is taken as UTC. `field` only
/// names the value in the error.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_with_offset(field, raw).map(|ts| ts.with_timezone(&Utc))
}

/// Parse a timestamp keeping the offset it was written with
pub fn parse_with_offset(field: &str, raw: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| Error::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Calendar date in the timestamp's own offset, not converted to UTC
pub fn local_date(field: &str, raw: &str) -> Result<NaiveDate> {
    parse_with_offset(field, raw).map(|ts| ts.date_naive())
}

/// Parse an optional timestamp; `None` and empty strings stay `None`.
pub fn parse_optional(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_timestamp(field, value).map(Some),
        _ => Ok(None),
    }
}

/// Fractional hours between two instants
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}
