//! Night date strings and Julian date utilities
//!
//! A night is identified by a `YYYYMMDD` date string (UTC). Candidate epochs
//! arrive as Julian dates, so the decision time of a night is converted to a
//! Julian date before ages are computed.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

/// Julian date of the Unix epoch (1970-01-01T00:00:00 UTC)
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Date string (`YYYYMMDD`) of the current UTC night
pub fn current_datestr() -> String {
    now().format("%Y%m%d").to_string()
}

/// Parse a `YYYYMMDD` night string
pub fn parse_datestr(datestr: &str) -> Result<NaiveDate> {
    if datestr.len() != 8 || !datestr.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "Night must be formatted as YYYYMMDD, got '{}'",
            datestr
        )));
    }
    NaiveDate::parse_from_str(datestr, "%Y%m%d")
        .map_err(|e| Error::InvalidInput(format!("Invalid night '{}': {}", datestr, e)))
}

/// Convert a UTC timestamp to a Julian date
pub fn to_julian_date(timestamp: DateTime<Utc>) -> f64 {
    let seconds = timestamp.timestamp() as f64
        + f64::from(timestamp.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Convert a Julian date to a UTC timestamp (millisecond precision)
pub fn from_julian_date(jd: f64) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let millis = ((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1000.0).round();
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Julian date of the decision time for a night
///
/// The decision time is `hour_utc`:00 on the calendar day of `datestr`.
pub fn decision_julian_date(datestr: &str, hour_utc: u32) -> Result<f64> {
    let date = parse_datestr(datestr)?;
    let time = NaiveTime::from_hms_opt(hour_utc, 0, 0)
        .ok_or_else(|| Error::InvalidInput(format!("Invalid decision hour: {}", hour_utc)))?;
    Ok(to_julian_date(Utc.from_utc_datetime(&date.and_time(time))))
}

/// All nights from `start` to `end` inclusive, as date strings
pub fn nights_between(start: &str, end: &str) -> Result<Vec<String>> {
    let first = parse_datestr(start)?;
    let last = parse_datestr(end)?;
    if last < first {
        return Err(Error::InvalidInput(format!(
            "Night range ends ({}) before it starts ({})",
            end, start
        )));
    }
    Ok(first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| d.format("%Y%m%d").to_string())
        .collect())
}
