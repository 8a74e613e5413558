use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::utils::errors::ChartError;

/// Plain calendar-date layouts, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Date-time layouts; only the date part is kept
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Coerce a date-like string into a calendar date
///
/// Accepts `2024-01-31`, `20240131`, `2024/01/31`, `2024.01.31`, the same
/// forms followed by a time of day, and RFC 3339 timestamps.
pub fn parse_date_like(input: &str) -> Result<NaiveDate, ChartError> {
    let trimmed = input.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime.date());
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }

    Err(ChartError::Parse {
        value: input.to_string(),
    })
}
