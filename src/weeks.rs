use chrono::{Datelike, Duration, NaiveDate};

/// ISO-style week a date belongs to, with its Monday and Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Thursday rule: the week belongs to the year that holds its Thursday.
///
/// Dates in late December or early January may therefore land in the
/// neighbouring year's week.
pub fn iso_week(date: NaiveDate) -> WeekKey {
    let weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date + Duration::days(4 - weekday);
    let days_since_jan1 = i64::from(thursday.ordinal0());
    let week = ((days_since_jan1 + 1 + 6) / 7) as u32;
    let start = thursday - Duration::days(3);

    WeekKey {
        year: thursday.year(),
        week,
        start,
        end: start + Duration::days(6),
    }
}
