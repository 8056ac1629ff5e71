use chrono::{Datelike, NaiveDate, Weekday};

use crate::datetime::{add_days, last_day_of_month};
use crate::interval::DateInterval;

/// The ten US federal holidays of `year`, as single-day flags in calendar
/// order. Floating holidays are computed from their weekday rule. A year
/// outside chrono's calendar yields no holidays.
pub fn us_federal_holidays(year: i32) -> Vec<DateInterval> {
    let holidays = [
        ("New Year's Day", NaiveDate::from_ymd_opt(year, 1, 1)),
        ("Martin Luther King Jr. Day", nth_weekday(year, 1, Weekday::Mon, 3)),
        ("Presidents' Day", nth_weekday(year, 2, Weekday::Mon, 3)),
        ("Memorial Day", last_weekday(year, 5, Weekday::Mon)),
        ("Independence Day", NaiveDate::from_ymd_opt(year, 7, 4)),
        ("Labor Day", nth_weekday(year, 9, Weekday::Mon, 1)),
        ("Columbus Day", nth_weekday(year, 10, Weekday::Mon, 2)),
        ("Veterans Day", NaiveDate::from_ymd_opt(year, 11, 11)),
        ("Thanksgiving Day", nth_weekday(year, 11, Weekday::Thu, 4)),
        ("Christmas Day", NaiveDate::from_ymd_opt(year, 12, 25)),
    ];

    holidays
        .into_iter()
        .filter_map(|(name, date)| date.and_then(|date| DateInterval::new(name, date, None).ok()))
        .collect()
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    add_days(last, -i64::from(back))
}
