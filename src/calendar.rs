//! Calendar math for the plan's week grid
//!
//! A plan starts on any weekday and runs for twelve calendar months
//! (365 or 366 days, end exclusive). Weeks 1..51 are exactly seven days;
//! week 52 absorbs the one or two trailing days so every date belongs to a
//! numbered week.

use chrono::{Datelike, Months, NaiveDate, Weekday};

pub const SEASON_WEEKS: u32 = 52;
pub const DAYS_PER_WEEK: i64 = 7;

/// Exclusive end date: start plus twelve calendar months
pub fn plan_end_date(start: NaiveDate) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(12))
}

pub fn plan_length_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Whether `date` lies in `[start, end)`
pub fn in_plan(start: NaiveDate, end: NaiveDate, date: NaiveDate) -> bool {
    date >= start && date < end
}

/// 1-based week number of `date`, or None when it falls outside the plan
pub fn week_of(start: NaiveDate, end: NaiveDate, date: NaiveDate) -> Option<u32> {
    if !in_plan(start, end, date) {
        return None;
    }
    let offset = (date - start).num_days() / DAYS_PER_WEEK;
    Some((offset as u32 + 1).min(SEASON_WEEKS))
}

/// Half-open `[start, end)` boundaries of a week
pub fn week_bounds(plan_start: NaiveDate, plan_end: NaiveDate, week: u32) -> (NaiveDate, NaiveDate) {
    let start = plan_start + chrono::Duration::days((week as i64 - 1) * DAYS_PER_WEEK);
    let end = if week >= SEASON_WEEKS {
        plan_end
    } else {
        start + chrono::Duration::days(DAYS_PER_WEEK)
    };
    (start, end)
}

/// Every date of a week, in order
pub fn week_dates(plan_start: NaiveDate, plan_end: NaiveDate, week: u32) -> Vec<NaiveDate> {
    let (start, end) = week_bounds(plan_start, plan_end, week);
    start.iter_days().take_while(|d| *d < end).collect()
}

/// Sunday = 0 .. Saturday = 6
pub fn day_of_week_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_plan_length_regular_and_leap() {
        let start = d(2025, 1, 6);
        let end = plan_end_date(start).unwrap();
        assert_eq!(end, d(2026, 1, 6));
        assert_eq!(plan_length_days(start, end), 365);

        let leap_start = d(2027, 9, 1);
        let leap_end = plan_end_date(leap_start).unwrap();
        assert_eq!(plan_length_days(leap_start, leap_end), 366);
    }

    #[test]
    fn test_week_of_boundaries() {
        let start = d(2025, 1, 6);
        let end = plan_end_date(start).unwrap();
        assert_eq!(week_of(start, end, start), Some(1));
        assert_eq!(week_of(start, end, d(2025, 1, 12)), Some(1));
        assert_eq!(week_of(start, end, d(2025, 1, 13)), Some(2));
        assert_eq!(week_of(start, end, d(2026, 1, 5)), Some(52));
        assert_eq!(week_of(start, end, end), None);
        assert_eq!(week_of(start, end, d(2025, 1, 5)), None);
    }

    #[test]
    fn test_weeks_abut_and_cover_the_plan() {
        let start = d(2027, 9, 1);
        let end = plan_end_date(start).unwrap();
        let mut cursor = start;
        let mut total = 0;
        for week in 1..=SEASON_WEEKS {
            let (ws, we) = week_bounds(start, end, week);
            assert_eq!(ws, cursor);
            total += week_dates(start, end, week).len();
            cursor = we;
        }
        assert_eq!(cursor, end);
        assert_eq!(total, 366);
        assert_eq!(week_dates(start, end, 52).len(), 9);
    }

    #[test]
    fn test_day_of_week_index_starts_sunday() {
        assert_eq!(day_of_week_index(d(2025, 1, 5)), 0);
        assert_eq!(day_of_week_index(d(2025, 1, 8)), 3);
        assert_eq!(weekday_from_index(3), Some(Weekday::Wed));
        assert_eq!(weekday_from_index(7), None);
    }
}
