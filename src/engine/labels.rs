//! Axis labels, one per bucket, in the same index order the bucketer uses

use crate::types::PeriodPlan;
use crate::utils::time::{month_abbr, shift_month, utc_date, DAY_MS, WEEK_MS};
use chrono::{Datelike, Duration};

const DAY_FORMAT: &str = "%b %d";
const WEEK_DAY_FORMAT: &str = "%b %d %Y";

pub fn axis_labels(plan: &PeriodPlan) -> Vec<String> {
    match *plan {
        PeriodPlan::Daily { anchor, count } => (0..count as i64)
            .map(|i| utc_date(anchor + i * DAY_MS).format(DAY_FORMAT).to_string())
            .collect(),
        PeriodPlan::Weekly { anchor, count } => (0..count as i64)
            .map(|i| {
                let first = utc_date(anchor + i * WEEK_MS);
                let last = first + Duration::days(6);
                format!(
                    "{} - {}",
                    first.format(WEEK_DAY_FORMAT),
                    last.format(WEEK_DAY_FORMAT)
                )
            })
            .collect(),
        PeriodPlan::Monthly { anchor, count } => {
            let start = utc_date(anchor);
            (0..count as u32)
                .map(|i| {
                    let (year, month0) = shift_month(start.year(), start.month0(), i);
                    format!("{} {}", month_abbr(month0), year)
                })
                .collect()
        }
    }
}
