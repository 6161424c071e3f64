//! UTC calendar arithmetic shared by the classifier, bucketer and label generator.
//! Everything here works on UTC fields only; local time would shift day and
//! week boundaries near midnight.

use crate::error::AnalyticsError;
use crate::types::DateRange;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

pub const DAY_MS: i64 = 24 * 3600 * 1000;
pub const WEEK_MS: i64 = 7 * DAY_MS;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Epoch milliseconds of UTC midnight on `date`
pub fn date_to_epoch_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// UTC calendar date containing the epoch-ms instant. Instants beyond
/// chrono's calendar saturate to its first or last date, so they land in an
/// edge bucket instead of somewhere in 1970.
pub fn utc_date(ms: i64) -> NaiveDate {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.date_naive(),
        None => {
            tracing::warn!(ms, "timestamp outside the supported calendar");
            if ms < 0 {
                NaiveDate::MIN
            } else {
                NaiveDate::MAX
            }
        }
    }
}

/// Monday of the week containing `date` (a Sunday belongs to the week that
/// started six days earlier)
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Whole calendar months from `from` to `to`, ignoring the day of month
pub fn month_diff(to: NaiveDate, from: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

/// `(year, month0)` advanced by `months`, carrying into the year
pub fn shift_month(year: i32, month0: u32, months: u32) -> (i32, u32) {
    let total = year as i64 * 12 + month0 as i64 + months as i64;
    (total.div_euclid(12) as i32, total.rem_euclid(12) as u32)
}

pub fn month_abbr(month0: u32) -> &'static str {
    MONTH_ABBR[(month0 % 12) as usize]
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Range shown when the user has not picked one: the first of the current
/// month through today.
pub fn default_range(today: NaiveDate) -> Result<DateRange, AnalyticsError> {
    DateRange::new(month_start(today), today)
}
