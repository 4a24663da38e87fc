//! Reporting periods and their resolution to concrete date ranges.
//!
//! Every period resolves to a half-open `[start, end)` range of local
//! (Tashkent) wall-clock time. Resolution is pure: `now` is computed
//! once per incoming update and threaded through, so a request served
//! across midnight stays on a single calendar day.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Uzbek month names, indexed by `month - 1`.
pub const MONTH_NAMES: [&str; 12] = [
    "Yanvar", "Fevral", "Mart", "Aprel", "May", "Iyun", "Iyul", "Avgust", "Sentabr", "Oktabr",
    "Noyabr", "Dekabr",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    MonthYear,
    Year,
    Date,
}

pub type DateRange = (NaiveDateTime, NaiveDateTime);

/// Resolves a period (and its optional value) against `now`.
///
/// Malformed `MonthYear`/`Date` values degrade to today's range rather
/// than erroring; a missing or malformed `Year` value means the
/// current year. Weeks start on Monday.
pub fn resolve(period: Period, value: Option<&str>, now: NaiveDateTime) -> DateRange {
    let today = now.date();
    match period {
        Period::Today => day_range(today),
        Period::Yesterday => day_range(today - Duration::days(1)),
        Period::ThisWeek => week_range(today.week(Weekday::Mon).first_day()),
        Period::LastWeek => week_range(today.week(Weekday::Mon).first_day() - Duration::days(7)),
        Period::ThisMonth => {
            month_range(today.year(), today.month()).unwrap_or_else(|| day_range(today))
        }
        Period::LastMonth => {
            let (year, month) = match today.month() {
                1 => (today.year() - 1, 12),
                m => (today.year(), m - 1),
            };
            month_range(year, month).unwrap_or_else(|| day_range(today))
        }
        Period::MonthYear => value
            .and_then(parse_month_year)
            .and_then(|(month, year)| month_range(year, month))
            .unwrap_or_else(|| day_range(today)),
        Period::Year => {
            let year = value
                .and_then(|v| v.trim().parse::<i32>().ok())
                .unwrap_or_else(|| today.year());
            year_range(year).unwrap_or_else(|| day_range(today))
        }
        Period::Date => value
            .and_then(parse_date_value)
            .map(day_range)
            .unwrap_or_else(|| day_range(today)),
    }
}

/// Parses a `"Oy (yyyy)"` month-year value, e.g. `"Yanvar (2025)"`.
pub fn parse_month_year(value: &str) -> Option<(u32, i32)> {
    let (name, rest) = value.trim().split_once(" (")?;
    let year = rest.strip_suffix(')')?.trim();
    if year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month = month_number(name.trim())?;
    Some((month, year))
}

/// Parses a `dd.mm.yyyy` value; single-digit day and month are fine.
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let mut parts = value.trim().split('.');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year = parts.next()?.trim();
    if parts.next().is_some() || year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

fn day_range(day: NaiveDate) -> DateRange {
    let next = day.succ_opt().unwrap_or(day);
    (day.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN))
}

fn week_range(monday: NaiveDate) -> DateRange {
    (
        monday.and_time(NaiveTime::MIN),
        (monday + Duration::days(7)).and_time(NaiveTime::MIN),
    )
}

fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = match month {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        m => NaiveDate::from_ymd_opt(year, m + 1, 1)?,
    };
    Some((start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN)))
}

fn year_range(year: i32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    Some((start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::MIN)
    }

    #[test]
    fn today_is_a_single_half_open_day() {
        let (start, end) = resolve(Period::Today, None, now());
        assert_eq!(start, date(2025, 3, 15));
        assert_eq!(end, date(2025, 3, 16));
    }

    #[test]
    fn yesterday_shifts_back_one_day() {
        let (start, end) = resolve(Period::Yesterday, None, now());
        assert_eq!(start, date(2025, 3, 14));
        assert_eq!(end, date(2025, 3, 15));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2025-03-15 is a Saturday; its week starts on the 10th.
        let (start, end) = resolve(Period::ThisWeek, None, now());
        assert_eq!(start, date(2025, 3, 10));
        assert_eq!(end, date(2025, 3, 17));

        let (start, end) = resolve(Period::LastWeek, None, now());
        assert_eq!(start, date(2025, 3, 3));
        assert_eq!(end, date(2025, 3, 10));
    }

    #[test]
    fn last_month_crosses_january_into_previous_year() {
        let january = NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let (start, end) = resolve(Period::LastMonth, None, january);
        assert_eq!(start, date(2024, 12, 1));
        assert_eq!(end, date(2025, 1, 1));
    }

    #[test]
    fn month_year_value_resolves_the_named_month() {
        let (start, end) = resolve(Period::MonthYear, Some("Yanvar (2025)"), now());
        assert_eq!(start, date(2025, 1, 1));
        assert_eq!(end, date(2025, 2, 1));

        let (start, end) = resolve(Period::MonthYear, Some("Dekabr (2024)"), now());
        assert_eq!(start, date(2024, 12, 1));
        assert_eq!(end, date(2025, 1, 1));
    }

    #[test]
    fn malformed_month_year_falls_back_to_today() {
        for bad in ["Smarch (2025)", "Yanvar 2025", "Yanvar (20256)", ""] {
            let (start, end) = resolve(Period::MonthYear, Some(bad), now());
            assert_eq!((start, end), resolve(Period::Today, None, now()), "{bad:?}");
        }
    }

    #[test]
    fn malformed_date_falls_back_to_today() {
        for bad in ["31.02.2025", "15-03-2025", "15.03.25", "abc"] {
            let (start, end) = resolve(Period::Date, Some(bad), now());
            assert_eq!((start, end), resolve(Period::Today, None, now()), "{bad:?}");
        }
    }

    #[test]
    fn date_value_accepts_single_digit_day_and_month() {
        let (start, end) = resolve(Period::Date, Some("5.3.2025"), now());
        assert_eq!(start, date(2025, 3, 5));
        assert_eq!(end, date(2025, 3, 6));
    }

    #[test]
    fn year_defaults_to_current_year() {
        let (start, end) = resolve(Period::Year, None, now());
        assert_eq!(start, date(2025, 1, 1));
        assert_eq!(end, date(2026, 1, 1));

        let (start, end) = resolve(Period::Year, Some("2023"), now());
        assert_eq!(start, date(2023, 1, 1));
        assert_eq!(end, date(2024, 1, 1));
    }
}
