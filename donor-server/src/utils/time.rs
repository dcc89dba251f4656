//! Time helpers
//!
//! Persistence works in i64 Unix millis (UTC). Calendar arithmetic happens
//! here, in UTC; only the sweep schedule looks at local wall-clock time.

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, TimeZone, Utc};

use super::{AppError, AppResult};

pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Add calendar months in UTC, keeping the time of day. A day-of-month
/// past the end of the target month rolls over into the next month
/// (Jan 31 + 3 months = May 1 in a leap year).
pub fn add_calendar_months(from_ms: i64, months: u32) -> Option<i64> {
    let from = DateTime::<Utc>::from_timestamp_millis(from_ms)?;
    let first_of_month = from.with_day(1)?;
    let shifted = first_of_month.checked_add_months(Months::new(months))?;
    shifted
        .checked_add_signed(Duration::days(i64::from(from.day()) - 1))
        .map(|dt| dt.timestamp_millis())
}

/// Add whole 24h days
pub fn add_days(from_ms: i64, days: i64) -> Option<i64> {
    days.checked_mul(DAY_MILLIS)
        .and_then(|delta| from_ms.checked_add(delta))
}

/// Parse a wall-clock time of day (HH:MM)
pub fn parse_time_of_day(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::validation(format!("Invalid time of day (HH:MM): {value}")))
}

/// Time left until the next occurrence of `at` in `now`'s time zone.
///
/// A DST gap swallowing `at` skips to the next day that has it.
pub fn until_next_daily<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> std::time::Duration {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).latest()
            && candidate > *now
        {
            return (candidate - now.clone()).to_std().unwrap_or_default();
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    std::time::Duration::from_millis(DAY_MILLIS as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn utc_millis(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn calendar_months_roll_over_short_months() {
        assert_eq!(
            add_calendar_months(utc_millis(2024, 1, 31), 3),
            Some(utc_millis(2024, 5, 1))
        );
        assert_eq!(
            add_calendar_months(utc_millis(2023, 11, 30), 3),
            Some(utc_millis(2024, 3, 1))
        );
        assert_eq!(
            add_calendar_months(utc_millis(2024, 4, 30), 1),
            Some(utc_millis(2024, 5, 30))
        );
        assert_eq!(
            add_calendar_months(utc_millis(2024, 3, 15), 3),
            Some(utc_millis(2024, 6, 15))
        );
    }

    #[test]
    fn fixed_days_are_exact() {
        assert_eq!(
            add_days(utc_millis(2023, 1, 31), 90),
            Some(utc_millis(2023, 5, 1))
        );
        assert_eq!(add_days(0, 1), Some(DAY_MILLIS));
        assert_eq!(add_days(i64::MAX, 1), None);
    }

    #[test]
    fn calendar_and_fixed_differ_across_short_months() {
        let d = utc_millis(2024, 1, 31);
        assert_ne!(add_calendar_months(d, 3), add_days(d, 90));
    }

    #[test]
    fn calendar_months_keep_time_of_day() {
        let d = utc_millis(2024, 1, 31) + 13 * 3_600_000 + 45 * 60_000;
        assert_eq!(
            add_calendar_months(d, 3),
            Some(utc_millis(2024, 5, 1) + 13 * 3_600_000 + 45 * 60_000)
        );
    }

    #[test]
    fn parse_time_of_day_accepts_hh_mm() {
        assert_eq!(
            parse_time_of_day("02:10").unwrap(),
            NaiveTime::from_hms_opt(2, 10, 0).unwrap()
        );
        assert!(parse_time_of_day("2am").is_err());
    }

    #[test]
    fn next_daily_run_today_or_tomorrow() {
        let tz = FixedOffset::east_opt(6 * 3600).unwrap();
        let at = NaiveTime::from_hms_opt(2, 10, 0).unwrap();

        let before = tz.with_ymd_and_hms(2024, 5, 1, 1, 10, 0).unwrap();
        assert_eq!(
            until_next_daily(&before, at),
            std::time::Duration::from_secs(3600)
        );

        let after = tz.with_ymd_and_hms(2024, 5, 1, 2, 10, 0).unwrap();
        assert_eq!(
            until_next_daily(&after, at),
            std::time::Duration::from_secs(24 * 3600)
        );
    }
}
