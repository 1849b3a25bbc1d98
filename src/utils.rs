use crate::error::{Result, TrackerError};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Cells the sheet writer historically produced for missing values.
const BLANK_MARKERS: [&str; 7] = ["", "nan", "none", "null", "n/a", "nat", "-"];

pub fn is_blank_cell(cell: &str) -> bool {
    let trimmed = cell.trim();
    BLANK_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parses a calendar date from a spreadsheet cell.
///
/// Accepts plain dates, date-times (the time part is discarded) and RFC 3339 timestamps
/// (the local calendar date of the timestamp is kept).
pub fn parse_sheet_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    // chrono's %Y happily reads "24" as year 24, so two-digit years are routed explicitly
    if let Some((_, year)) = trimmed.rsplit_once('/') {
        if year.len() == 2 {
            return NaiveDate::parse_from_str(trimmed, "%m/%d/%y").ok();
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.date_naive());
    }

    // "2024-01-05 00:00:00-06:00" and similar offset-suffixed stamps
    let (prefix, rest) = (trimmed.get(..10)?, trimmed.get(10..)?);
    if !is_time_suffix(rest) {
        return None;
    }
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// `T` or a space, then `hh:mm`.
fn is_time_suffix(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() >= 6
        && (bytes[0] == b'T' || bytes[0] == b' ')
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
        && bytes[3] == b':'
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
}

pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a numeric cell, tolerating surrounding whitespace and thousands separators.
pub fn parse_decimal(cell: &str) -> Option<f64> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts a decimal to a non-negative whole count. Fractional or negative values are rejected.
pub fn decimal_to_count(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    let rounded = value.round();
    if (value - rounded).abs() > 1e-9 {
        return None;
    }
    Some(rounded as u32)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Inclusive window of `days` calendar days ending on `reference`.
pub fn trailing_window(reference: NaiveDate, days: u64) -> Result<(NaiveDate, NaiveDate)> {
    if days == 0 {
        return Err(TrackerError::DateError(
            "Trailing window must span at least one day".to_string(),
        ));
    }
    let start = reference
        .checked_sub_days(Days::new(days - 1))
        .ok_or_else(|| {
            TrackerError::DateError(format!(
                "Cannot compute a {}-day window ending {}",
                days, reference
            ))
        })?;
    Ok((start, reference))
}
