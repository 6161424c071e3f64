//! Series bucketing
//! Sums irregular per-day call records into one fixed-length array per series.

use crate::error::AnalyticsError;
use crate::types::{CallRecord, PeriodPlan};
use crate::utils::time::{month_diff, utc_date, DAY_MS, WEEK_MS};

/// What to do with a record whose bucket index falls outside the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfRange {
    /// Fail with `BucketIndexOutOfRange`
    Reject,
    /// Fold the record into the nearest edge bucket and count it
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucketed {
    pub counts: Vec<u64>,
    /// Records that fell outside the plan and were folded into an edge bucket
    pub clamped: usize,
}

/// Zero-based period offset of `date` relative to the plan's anchor.
/// May be negative or past the end when the record lies outside the range.
pub fn bucket_index(plan: &PeriodPlan, date: i64) -> i64 {
    match *plan {
        PeriodPlan::Daily { anchor, .. } => date.saturating_sub(anchor).div_euclid(DAY_MS),
        PeriodPlan::Weekly { anchor, .. } => date.saturating_sub(anchor).div_euclid(WEEK_MS),
        PeriodPlan::Monthly { anchor, .. } => month_diff(utc_date(date), utc_date(anchor)),
    }
}

pub fn bucket_counts(
    plan: &PeriodPlan,
    records: &[CallRecord],
    policy: OutOfRange,
) -> Result<Bucketed, AnalyticsError> {
    let period_count = plan.count();
    let mut counts = vec![0u64; period_count];
    let mut clamped = 0;

    if period_count == 0 {
        return match records.first() {
            Some(record) if policy == OutOfRange::Reject => Err(AnalyticsError::BucketIndexOutOfRange {
                index: bucket_index(plan, record.date),
                period_count,
                date: record.date,
            }),
            _ => Ok(Bucketed {
                counts,
                clamped: records.len(),
            }),
        };
    }

    for record in records {
        let index = bucket_index(plan, record.date);
        let slot = if (0..period_count as i64).contains(&index) {
            index as usize
        } else {
            match policy {
                OutOfRange::Reject => {
                    return Err(AnalyticsError::BucketIndexOutOfRange {
                        index,
                        period_count,
                        date: record.date,
                    })
                }
                OutOfRange::Clamp => {
                    clamped += 1;
                    if index < 0 {
                        0
                    } else {
                        period_count - 1
                    }
                }
            }
        };
        counts[slot] += record.count;
    }

    Ok(Bucketed { counts, clamped })
}
