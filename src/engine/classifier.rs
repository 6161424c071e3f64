//! Granularity classification
//! Picks daily, weekly or monthly buckets from the span of the requested range
//! and computes the anchor and bucket count every other stage shares.

use crate::types::{DateRange, PeriodPlan};
use crate::utils::time::{date_to_epoch_ms, month_diff, month_start, week_start, DAY_MS, WEEK_MS};

/// Ranges of up to this many days (inclusive) are charted per day
const DAILY_MAX_DAYS: i64 = 14;

/// Ranges spanning fewer calendar months than this are charted per week
const WEEKLY_MAX_MONTHS: i64 = 6;

pub fn classify(range: &DateRange) -> PeriodPlan {
    let from = date_to_epoch_ms(range.from());
    // Both ends are included, so the interval ends at midnight after `to`
    let to_exclusive = date_to_epoch_ms(range.to()) + DAY_MS;
    let day_diff = (to_exclusive - from).div_euclid(DAY_MS);

    if day_diff <= DAILY_MAX_DAYS {
        return PeriodPlan::Daily {
            anchor: from,
            count: day_diff as usize,
        };
    }

    let months = month_diff(range.to(), range.from());
    if months < WEEKLY_MAX_MONTHS {
        let anchor = date_to_epoch_ms(week_start(range.from()));
        let end = date_to_epoch_ms(week_start(range.to())) + WEEK_MS;
        PeriodPlan::Weekly {
            anchor,
            count: (end - anchor).div_euclid(WEEK_MS) as usize,
        }
    } else {
        PeriodPlan::Monthly {
            anchor: date_to_epoch_ms(month_start(range.from())),
            count: (months + 1) as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Granularity;
    use chrono::{Duration, NaiveDate};

    fn range(from: (i32, u32, u32), to: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
        )
        .unwrap()
    }

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        date_to_epoch_ms(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_ten_day_range_is_daily() {
        let plan = classify(&range((2024, 1, 1), (2024, 1, 10)));
        assert_eq!(
            plan,
            PeriodPlan::Daily {
                anchor: ms(2024, 1, 1),
                count: 10
            }
        );
    }

    #[test]
    fn test_single_day_is_one_daily_bucket() {
        let plan = classify(&range((2024, 2, 29), (2024, 2, 29)));
        assert_eq!(plan.granularity(), Granularity::Daily);
        assert_eq!(plan.count(), 1);
    }

    #[test]
    fn test_daily_count_matches_day_span_up_to_fourteen() {
        let from = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        for days in 1..=14 {
            let to = from + Duration::days(days - 1);
            let plan = classify(&DateRange::new(from, to).unwrap());
            assert_eq!(plan.granularity(), Granularity::Daily, "{} days", days);
            assert_eq!(plan.count() as i64, days);
        }
    }

    #[test]
    fn test_fifteen_days_switches_to_weekly() {
        let fourteen = classify(&range((2024, 1, 1), (2024, 1, 14)));
        let fifteen = classify(&range((2024, 1, 1), (2024, 1, 15)));
        assert_eq!(fourteen.granularity(), Granularity::Daily);
        assert_eq!(fifteen.granularity(), Granularity::Weekly);
        // Jan 1 and Jan 15 2024 are Mondays: three weeks are touched
        assert_eq!(fifteen.count(), 3);
    }

    #[test]
    fn test_two_month_range_is_weekly_anchored_on_monday() {
        let plan = classify(&range((2024, 1, 1), (2024, 3, 1)));
        assert_eq!(
            plan,
            PeriodPlan::Weekly {
                anchor: ms(2024, 1, 1),
                count: 9
            }
        );
    }

    #[test]
    fn test_weekly_anchor_backs_up_from_sunday() {
        // 2024-03-10 is a Sunday; its week started Monday 2024-03-04
        let plan = classify(&range((2024, 3, 10), (2024, 4, 10)));
        assert_eq!(plan.granularity(), Granularity::Weekly);
        assert_eq!(plan.anchor(), ms(2024, 3, 4));
        // Mar 4 .. week of Apr 8 inclusive
        assert_eq!(plan.count(), 6);
    }

    #[test]
    fn test_month_diff_five_is_weekly_six_is_monthly() {
        let five = classify(&range((2024, 1, 15), (2024, 6, 30)));
        let six = classify(&range((2024, 1, 15), (2024, 7, 1)));
        assert_eq!(five.granularity(), Granularity::Weekly);
        assert_eq!(
            six,
            PeriodPlan::Monthly {
                anchor: ms(2024, 1, 1),
                count: 7
            }
        );
    }

    #[test]
    fn test_whole_year_is_twelve_months() {
        let plan = classify(&range((2024, 1, 1), (2024, 12, 31)));
        assert_eq!(plan.granularity(), Granularity::Monthly);
        assert_eq!(plan.count(), 12);
    }

    #[test]
    fn test_month_span_across_year_end() {
        let plan = classify(&range((2023, 11, 20), (2024, 8, 2)));
        assert_eq!(plan.anchor(), ms(2023, 11, 1));
        assert_eq!(plan.count(), 10);
    }
}
