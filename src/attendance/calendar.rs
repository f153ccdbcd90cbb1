//! Date windows and lateness arithmetic used by the reports.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use derive_more::Display;

use super::report::Punctuality;
use crate::error::{AppError, AppResult};

/// Half-open `[start, end)` window.
pub type Window = (NaiveDateTime, NaiveDateTime);

pub fn day_window(date: NaiveDate) -> Window {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

pub fn first_of_month(year: i32, month: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid month {month}/{year}")))
}

fn first_of_next_month(first: NaiveDate) -> AppResult<NaiveDate> {
    let (year, month) = match first.month() {
        12 => (first.year() + 1, 1),
        m => (first.year(), m + 1),
    };
    first_of_month(year, month)
}

pub fn month_window(year: i32, month: u32) -> AppResult<Window> {
    let first = first_of_month(year, month)?;
    let next = first_of_next_month(first)?;
    Ok((first.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN)))
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Mon-Fri days between the 1st and the last day of the month, inclusive.
pub fn working_days_in_month(year: i32, month: u32) -> AppResult<u32> {
    let first = first_of_month(year, month)?;
    let next = first_of_next_month(first)?;

    Ok(first
        .iter_days()
        .take_while(|d| *d < next)
        .filter(|d| is_working_day(*d))
        .count() as u32)
}

/// Late only when strictly after the tolerance cutoff.
pub fn classify(check_in: NaiveTime, tolerance: NaiveTime) -> Punctuality {
    if check_in > tolerance {
        Punctuality::Late
    } else {
        Punctuality::OnTime
    }
}

/// Time past the tolerance cutoff; zero when on time.
pub fn late_by(check_in: NaiveTime, tolerance: NaiveTime) -> Duration {
    if check_in > tolerance {
        check_in - tolerance
    } else {
        Duration::zero()
    }
}

/// Whole minutes past the tolerance cutoff.
pub fn late_minutes(check_in: NaiveTime, tolerance: NaiveTime) -> i64 {
    late_by(check_in, tolerance).num_minutes()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "{:02}:{:02}", hours, minutes)]
pub struct LateDuration {
    hours: i64,
    minutes: i64,
}

impl LateDuration {
    pub fn from_minutes(total: i64) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }
}

/// Seconds carry over between days; truncation to minutes happens once, on the total.
impl From<Duration> for LateDuration {
    fn from(total: Duration) -> Self {
        Self::from_minutes(total.num_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    #[rstest]
    #[case(2026, 1, 22)]
    #[case(2026, 2, 20)]
    #[case(2024, 2, 21)] // leap year, Feb 29 is a Thursday
    #[case(2025, 12, 23)]
    fn counts_weekdays(#[case] year: i32, #[case] month: u32, #[case] expected: u32) {
        assert_eq!(working_days_in_month(year, month).unwrap(), expected);
    }

    #[test]
    fn rejects_impossible_month() {
        assert!(matches!(
            working_days_in_month(2026, 13),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn december_window_rolls_into_next_year() {
        let (start, end) = month_window(2025, 12).unwrap();

        assert_eq!(start.to_string(), "2025-12-01 00:00:00");
        assert_eq!(end.to_string(), "2026-01-01 00:00:00");
    }

    #[test]
    fn day_window_is_half_open() {
        let (start, end) = day_window(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());

        assert_eq!(end - start, Duration::days(1));
        assert_eq!(end.to_string(), "2026-01-06 00:00:00");
    }

    #[rstest]
    #[case("08:14:59", Punctuality::OnTime)]
    #[case("08:15:00", Punctuality::OnTime)]
    #[case("08:15:01", Punctuality::Late)]
    #[case("13:00:00", Punctuality::Late)]
    fn tolerance_boundary(#[case] check_in: &str, #[case] expected: Punctuality) {
        assert_eq!(classify(t(check_in), t("08:15:00")), expected);
    }

    #[rstest]
    #[case("08:15:00", 0)]
    #[case("08:15:59", 0)]
    #[case("08:20:00", 5)]
    #[case("09:45:30", 90)]
    #[case("07:30:00", 0)]
    fn minutes_past_tolerance(#[case] check_in: &str, #[case] expected: i64) {
        assert_eq!(late_minutes(t(check_in), t("08:15:00")), expected);
    }

    #[rstest]
    #[case(0, "00:00")]
    #[case(5, "00:05")]
    #[case(128, "02:08")]
    #[case(600, "10:00")]
    fn formats_as_hours_and_minutes(#[case] minutes: i64, #[case] expected: &str) {
        assert_eq!(LateDuration::from_minutes(minutes).to_string(), expected);
    }

    #[test]
    fn partial_minutes_add_up_before_truncation() {
        let tolerance = t("08:15:00");
        let total = late_by(t("08:15:30"), tolerance) + late_by(t("08:15:40"), tolerance);

        assert_eq!(late_minutes(t("08:15:30"), tolerance), 0);
        assert_eq!(LateDuration::from(total).to_string(), "00:01");
    }
}
