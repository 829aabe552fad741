//! Utility functions for the price_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Date formats accepted in market data files, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date from the formats market data providers commonly emit.
///
/// Time-of-day and offsets are discarded: a daily bar stamped
/// `2024-03-01 00:00:00+03:00` belongs to 2024-03-01.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.date_naive());
    }

    None
}

/// Parse a date or fail with the surrounding context
pub fn parse_date_or_err(value: &str, context: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| ForecastError::invalid_date(value, context))
}

/// Create `horizon` consecutive daily dates following `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last;

    for _ in 0..horizon {
        current = current
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!("Date overflow after {}", current))
            })?;
        dates.push(current);
    }

    Ok(dates)
}

/// Days elapsed from `origin` to `date` as a float
pub fn days_between(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Parse an optional numeric cell; blanks and common null markers are missing values
pub fn parse_optional_f64(value: &str) -> std::result::Result<Option<f64>, String> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "" | "null" | "nan" | "na" | "n/a" | "none" | "-" => Ok(None),
        _ => value
            .parse::<f64>()
            .map(Some)
            .map_err(|e| format!("'{}': {}", value, e)),
    }
}
