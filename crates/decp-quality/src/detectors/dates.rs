//! Date-based detectors.

use chrono::NaiveDate;

use crate::error::{AuditError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date. Longer timestamps are cut to their first ten
/// characters first, so `2021-05-10T08:00:00+02:00` reads as `2021-05-10`.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let date: String = value.chars().take(10).collect();
    NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| AuditError::DateFormat {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `date` is strictly after `other`.
pub fn is_after(date: &str, other: &str) -> Result<bool> {
    Ok(parse_date(date)? > parse_date(other)?)
}

/// A contract notified after its data was published.
pub fn is_temporally_inconsistent(notification_date: &str, publication_date: &str) -> Result<bool> {
    is_after(notification_date, publication_date)
}

/// Publication happened more than `max_delay_days` after notification.
pub fn is_publication_delay_overrun(
    notification_date: &str,
    publication_date: &str,
    max_delay_days: i64,
) -> Result<bool> {
    let delay = parse_date(publication_date)? - parse_date(notification_date)?;
    Ok(delay.num_days() > max_delay_days)
}
