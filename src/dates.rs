/*
Calendar day helpers and relative-day classification.
Pure functions; callers pass `now` / `today` explicitly so results are testable.
*/

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Weekday};

use crate::error::{Error, Result};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

// Parse a "YYYY-MM-DD" string.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DAY_FORMAT).map_err(|_| Error::InvalidDay(s.to_string()))
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

// Local -> FixedOffset (current system offset)
pub fn now_fixed_offset() -> DateTime<FixedOffset> {
    chrono::Local::now().fixed_offset()
}

// A day is past once its last second (23:59:59 local) has elapsed.
pub fn is_past_day(day: NaiveDate, now: DateTime<FixedOffset>) -> bool {
    let Some(end_of_day) = day.and_hms_opt(23, 59, 59) else {
        return false;
    };
    now.naive_local() > end_of_day
}

pub fn is_today(day: NaiveDate, now: DateTime<FixedOffset>) -> bool {
    now.date_naive() == day
}

// Shift a day by a whole number of days (used for postponing).
pub fn day_delta(day: NaiveDate, days: i64) -> NaiveDate {
    day.checked_add_signed(Duration::days(days)).unwrap_or(day)
}

/// Human-oriented label of a day relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalDay {
    Yesterday,
    Today,
    Tomorrow,
    /// Within the last week or anywhere ahead, rendered as the weekday name.
    Weekday(Weekday),
    Date(NaiveDate),
}

// Rules:
// - yesterday / today / tomorrow by name
// - up to 7 days back, or any day ahead -> weekday
// - older days -> full date
pub fn natural_day(day: NaiveDate, today: NaiveDate) -> NaturalDay {
    let diff = (today - day).num_days();
    match diff {
        1 => NaturalDay::Yesterday,
        0 => NaturalDay::Today,
        -1 => NaturalDay::Tomorrow,
        i64::MIN..=7 => NaturalDay::Weekday(day.weekday()),
        _ => NaturalDay::Date(day),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl fmt::Display for NaturalDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NaturalDay::Yesterday => f.write_str("yesterday"),
            NaturalDay::Today => f.write_str("today"),
            NaturalDay::Tomorrow => f.write_str("tomorrow"),
            NaturalDay::Weekday(w) => f.write_str(weekday_name(*w)),
            NaturalDay::Date(d) => write!(f, "{}", d.format("%b. %-d, %Y")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
    }

    #[test]
    fn parse_and_format_round_trip() {
        assert_eq!(format_day(day("2024-03-09")), "2024-03-09");
        assert!(matches!(parse_day("2024-13-01"), Err(Error::InvalidDay(_))));
        assert!(matches!(parse_day("09.03.2024"), Err(Error::InvalidDay(_))));
    }

    #[test]
    fn day_becomes_past_after_its_last_second() {
        let d = day("2024-03-09");
        assert!(!is_past_day(d, at(2024, 3, 9, 12, 0, 0)));
        assert!(!is_past_day(d, at(2024, 3, 9, 23, 59, 59)));
        assert!(is_past_day(d, at(2024, 3, 10, 0, 0, 0)));
        assert!(!is_past_day(day("2024-03-10"), at(2024, 3, 9, 23, 0, 0)));
    }

    #[test]
    fn today_uses_local_date() {
        assert!(is_today(day("2024-03-09"), at(2024, 3, 9, 0, 30, 0)));
        assert!(!is_today(day("2024-03-08"), at(2024, 3, 9, 0, 30, 0)));
    }

    #[rstest]
    #[case("2024-03-08", "yesterday")]
    #[case("2024-03-09", "today")]
    #[case("2024-03-10", "tomorrow")]
    #[case("2024-03-04", "Monday")]
    #[case("2024-03-13", "Wednesday")]
    #[case("2024-02-20", "Feb. 20, 2024")]
    #[case("2024-04-01", "Monday")]
    #[case("2025-01-01", "Wednesday")]
    fn natural_day_labels(#[case] input: &str, #[case] expected: &str) {
        let today = day("2024-03-09");
        assert_eq!(natural_day(day(input), today).to_string(), expected);
    }

    #[test]
    fn day_delta_crosses_month_boundaries() {
        assert_eq!(day_delta(day("2024-02-28"), 2), day("2024-03-01"));
        assert_eq!(day_delta(day("2024-03-01"), -1), day("2024-02-29"));
    }
}
