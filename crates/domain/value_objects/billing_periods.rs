//! Billing period arithmetic for subscriptions.
//!
//! Month arithmetic uses chrono's calendar months: when the start day does not
//! exist in the target month the result is clamped to that month's last day
//! (2024-01-31 + 1 month = 2024-02-29, 2024-02-29 + 1 year = 2025-02-28).

use chrono::{DateTime, Months, Utc};
use thiserror::Error;

use crate::domain::value_objects::enums::billing_intervals::BillingInterval;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingPeriodError {
    #[error("invalid start date: {0}")]
    InvalidInput(String),
}

pub fn compute_end_date(
    start: DateTime<Utc>,
    interval: BillingInterval,
) -> Result<DateTime<Utc>, BillingPeriodError> {
    start
        .checked_add_months(Months::new(interval.months()))
        .ok_or_else(|| {
            BillingPeriodError::InvalidInput(format!(
                "{} + {} is out of range",
                start.to_rfc3339(),
                interval
            ))
        })
}

/// Same as [`compute_end_date`] for raw inputs: an RFC3339 start and a stored interval
/// string. Unrecognized intervals fall back to monthly.
pub fn compute_end_date_from_raw(
    start: &str,
    interval: &str,
) -> Result<DateTime<Utc>, BillingPeriodError> {
    let start = DateTime::parse_from_rfc3339(start.trim())
        .map_err(|err| BillingPeriodError::InvalidInput(format!("{start:?}: {err}")))?
        .with_timezone(&Utc);

    compute_end_date(start, BillingInterval::from_str_or_monthly(interval))
}

/// Whole days between two instants, rounded up, regardless of order.
pub fn duration_in_days(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let millis = (b - a).num_milliseconds().abs();
    ceil_days(millis)
}

pub fn is_expired(end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > end
}

/// Days left until `end`, rounded up. Negative once the period has passed.
pub fn days_remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_days((end - now).num_milliseconds())
}

fn ceil_days(millis: i64) -> i64 {
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}
