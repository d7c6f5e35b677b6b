//! Calendar arithmetic on naive wall-clock date-times.
//!
//! Everything here is a pure function. Field arithmetic rolls over the way a
//! calendar does (adding one month to Jan 31 lands in early March), and
//! [`diff`] is deliberately calendar-naive: a month is 30 days and a year is
//! 12 such months.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use super::locale::Language;
use crate::error::DateError;

pub const DEFAULT_FORMAT: &str = "YYYY-MM-DD HH:mm:ss.SSS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl TimeUnit {
    /// Length of one unit in milliseconds, using the 30-day month.
    fn millis(self) -> f64 {
        match self {
            TimeUnit::Millisecond => 1.0,
            TimeUnit::Second => 1_000.0,
            TimeUnit::Minute => 60_000.0,
            TimeUnit::Hour => 3_600_000.0,
            TimeUnit::Day => 86_400_000.0,
            TimeUnit::Month => 30.0 * 86_400_000.0,
            TimeUnit::Year => 12.0 * 30.0 * 86_400_000.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = s.trim().to_ascii_lowercase();
        let unit = unit.strip_suffix('s').unwrap_or(&unit);
        match unit {
            "year" => Ok(TimeUnit::Year),
            "month" => Ok(TimeUnit::Month),
            "day" => Ok(TimeUnit::Day),
            "hour" => Ok(TimeUnit::Hour),
            "minute" => Ok(TimeUnit::Minute),
            "second" => Ok(TimeUnit::Second),
            "millisecond" => Ok(TimeUnit::Millisecond),
            _ => Err(DateError::UnknownUnit(s.to_string())),
        }
    }
}

/// One `<amount><unit>` token such as `6d` or `30min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSpec {
    pub amount: i64,
    pub unit: TimeUnit,
}

impl DurationSpec {
    pub fn add_to(self, date: NaiveDateTime) -> NaiveDateTime {
        add(date, self.amount, self.unit)
    }

    pub fn subtract_from(self, date: NaiveDateTime) -> NaiveDateTime {
        add(date, -self.amount, self.unit)
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            TimeUnit::Year => "y",
            TimeUnit::Month => "m",
            TimeUnit::Day => "d",
            TimeUnit::Hour => "h",
            TimeUnit::Minute => "min",
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
        };
        write!(f, "{}{}", self.amount, suffix)
    }
}

/// Parse a single duration token (`y`, `m`, `d`, `h`, `min`, `s`, `ms`).
pub fn parse_duration(token: &str) -> Result<DurationSpec, DateError> {
    let token = token.trim();
    let split = token
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| DateError::InvalidDuration(token.to_string()))?;
    let (digits, suffix) = token.split_at(split);
    let amount: i64 = digits
        .parse()
        .map_err(|_| DateError::InvalidDuration(token.to_string()))?;
    let unit = match suffix {
        "y" => TimeUnit::Year,
        "m" => TimeUnit::Month,
        "d" => TimeUnit::Day,
        "h" => TimeUnit::Hour,
        "min" => TimeUnit::Minute,
        "s" => TimeUnit::Second,
        "ms" => TimeUnit::Millisecond,
        _ => return Err(DateError::InvalidDuration(token.to_string())),
    };
    Ok(DurationSpec { amount, unit })
}

/// Parse a space separated duration list such as `"1d 12h"`.
pub fn parse_durations(text: &str) -> Result<Vec<DurationSpec>, DateError> {
    let specs = text
        .split_whitespace()
        .map(parse_duration)
        .collect::<Result<Vec<_>, _>>()?;
    if specs.is_empty() {
        return Err(DateError::InvalidDuration(text.to_string()));
    }
    Ok(specs)
}

/// Parse `YYYY-MM-DD[ HH[:mm[:ss[.SSS]]]]` with the default separators.
pub fn parse(text: &str) -> Result<NaiveDateTime, DateError> {
    parse_with(text, '-', &[':', '.'])
}

/// Parse with explicit separators. Missing month/day default to the first;
/// a fourth time fragment is a decimal fraction of a second.
pub fn parse_with(
    text: &str,
    date_sep: char,
    time_seps: &[char],
) -> Result<NaiveDateTime, DateError> {
    let invalid = || DateError::InvalidDate(text.to_string());
    let mut parts = text.split_whitespace();
    let date_part = parts.next().ok_or_else(invalid)?;

    let fields = date_part
        .split(date_sep)
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    let year = fields[0];
    let month0 = fields.get(1).map(|m| m - 1).unwrap_or(0);
    let day = fields.get(2).copied().unwrap_or(1);

    let mut time = [0i64; 4];
    if let Some(time_part) = parts.next() {
        let fragments: Vec<&str> = time_part.split(|c| time_seps.contains(&c)).collect();
        for (i, fragment) in fragments.iter().enumerate().take(4) {
            time[i] = if i == 3 {
                let fraction: f64 = format!("0.{fragment}").parse().map_err(|_| invalid())?;
                (fraction * 1000.0).round() as i64
            } else {
                fragment.parse().map_err(|_| invalid())?
            };
        }
    }

    compose(year, month0, day, time[0], time[1], time[2], time[3]).ok_or_else(invalid)
}

/// Build a date-time from possibly out-of-range fields, rolling overflow into
/// the next larger field.
fn compose(
    year: i64,
    month0: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
    milli: i64,
) -> Option<NaiveDateTime> {
    let months = year.checked_mul(12)?.checked_add(month0)?;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = months.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    first
        .checked_add_signed(Duration::try_days(day - 1)?)?
        .checked_add_signed(Duration::try_hours(hour)?)?
        .checked_add_signed(Duration::try_minutes(minute)?)?
        .checked_add_signed(Duration::try_seconds(second)?)?
        .checked_add_signed(Duration::try_milliseconds(milli)?)
}

const TOKENS: [&str; 11] = [
    "YYYY", "MMMM", "SSS", "MMM", "MM", "DD", "HH", "mm", "ss", "D", "Q",
];

/// Token substitution, longest token first at every position.
pub fn format(date: NaiveDateTime, pattern: &str, lang: Language) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;
    'scan: while let Some(ch) = rest.chars().next() {
        for token in TOKENS {
            if rest.starts_with(token) {
                out.push_str(&token_value(date, token, lang));
                rest = &rest[token.len()..];
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn token_value(date: NaiveDateTime, token: &str, lang: Language) -> String {
    match token {
        "YYYY" => format!("{:04}", date.year()),
        "MMMM" => lang.month_long(date.month0()),
        "MMM" => lang.month_short(date.month0()),
        "MM" => format!("{:02}", date.month()),
        "DD" => format!("{:02}", date.day()),
        "D" => date.day().to_string(),
        "HH" => format!("{:02}", date.hour()),
        "mm" => format!("{:02}", date.minute()),
        "ss" => format!("{:02}", date.second()),
        "SSS" => format!("{:03}", date.nanosecond() / 1_000_000),
        "Q" => quarter(date).to_string(),
        _ => String::new(),
    }
}

/// Floor of `a - b` expressed in `unit` (30-day months, 360-day years).
pub fn diff(a: NaiveDateTime, b: NaiveDateTime, unit: TimeUnit) -> i64 {
    let millis = (a - b).num_milliseconds() as f64;
    (millis / unit.millis()).floor() as i64
}

/// Exact elapsed hours, fractional.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Apply `qty` to exactly one field, rolling overflow like a calendar.
pub fn add(date: NaiveDateTime, qty: i64, unit: TimeUnit) -> NaiveDateTime {
    let shifted = match unit {
        TimeUnit::Year | TimeUnit::Month => {
            let (years, months) = if unit == TimeUnit::Year {
                (qty, 0)
            } else {
                (0, qty)
            };
            compose(
                date.year() as i64 + years,
                date.month0() as i64 + months,
                date.day() as i64,
                date.hour() as i64,
                date.minute() as i64,
                date.second() as i64,
                (date.nanosecond() / 1_000_000) as i64,
            )
        }
        TimeUnit::Day => Duration::try_days(qty).and_then(|d| date.checked_add_signed(d)),
        TimeUnit::Hour => Duration::try_hours(qty).and_then(|d| date.checked_add_signed(d)),
        TimeUnit::Minute => Duration::try_minutes(qty).and_then(|d| date.checked_add_signed(d)),
        TimeUnit::Second => Duration::try_seconds(qty).and_then(|d| date.checked_add_signed(d)),
        TimeUnit::Millisecond => {
            Duration::try_milliseconds(qty).and_then(|d| date.checked_add_signed(d))
        }
    };
    shifted.unwrap_or(date)
}

/// Zero every field finer than `unit`.
pub fn start_of(date: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    let keep = |field: TimeUnit| field >= unit;
    let month = if keep(TimeUnit::Month) { date.month() } else { 1 };
    let day = if keep(TimeUnit::Day) { date.day() } else { 1 };
    let hour = if keep(TimeUnit::Hour) { date.hour() } else { 0 };
    let minute = if keep(TimeUnit::Minute) { date.minute() } else { 0 };
    let second = if keep(TimeUnit::Second) { date.second() } else { 0 };
    let milli = if keep(TimeUnit::Millisecond) {
        date.nanosecond() / 1_000_000
    } else {
        0
    };
    NaiveDate::from_ymd_opt(date.year(), month, day)
        .and_then(|d| d.and_hms_milli_opt(hour, minute, second, milli))
        .unwrap_or(date)
}

/// First instant of the calendar quarter containing `date`.
pub fn start_of_quarter(date: NaiveDateTime) -> NaiveDateTime {
    let month = start_of(date, TimeUnit::Month);
    add(month, -((date.month0() % 3) as i64), TimeUnit::Month)
}

pub fn quarter(date: NaiveDateTime) -> u32 {
    date.month0() / 3 + 1
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(date: NaiveDateTime) -> u32 {
    match date.month() {
        2 if is_leap_year(date.year()) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn days_in_quarter(date: NaiveDateTime) -> u32 {
    let first = start_of_quarter(date);
    (0..3)
        .map(|m| days_in_month(add(first, m, TimeUnit::Month)))
        .sum()
}

pub fn days_in_year(date: NaiveDateTime) -> u32 {
    if is_leap_year(date.year()) {
        366
    } else {
        365
    }
}

/// True when every time-of-day field is zero.
pub fn is_midnight(date: NaiveDateTime) -> bool {
    date.time() == chrono::NaiveTime::MIN
}

/// Current local wall-clock time.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(text: &str) -> NaiveDateTime {
        parse(text).unwrap()
    }

    #[test]
    fn parses_date_and_time_fragments() {
        let d = dt("2024-04-01 09:30:15.25");
        assert_eq!(d.year(), 2024);
        assert_eq!(d.month(), 4);
        assert_eq!(d.hour(), 9);
        assert_eq!(d.minute(), 30);
        assert_eq!(d.second(), 15);
        assert_eq!(d.nanosecond() / 1_000_000, 250);
        assert_eq!(dt("2024"), dt("2024-01-01"));
        assert_eq!(
            parse_with("2024/03/05 10.30", '/', &['.']).unwrap(),
            dt("2024-03-05 10:30")
        );
        assert_eq!(dt("2024-01-32"), dt("2024-02-01"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not a date").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn format_prefers_longest_token() {
        let d = dt("2024-03-05 07:08:09.010");
        assert_eq!(format(d, DEFAULT_FORMAT, Language::En), "2024-03-05 07:08:09.010");
        assert_eq!(format(d, "D MMMM", Language::En), "5 March");
        assert_eq!(format(d, "D MMM", Language::En), "5 Mar");
        assert_eq!(format(d, "YYYY Q", Language::En), "2024 1");
    }

    #[test]
    fn diff_floors_and_uses_flat_months() {
        let a = dt("2024-03-01");
        let b = dt("2024-01-01");
        assert_eq!(diff(a, b, TimeUnit::Day), 60);
        assert_eq!(diff(a, b, TimeUnit::Month), 2);
        assert_eq!(diff(b, a, TimeUnit::Year), -1);
        assert_eq!(diff(dt("2024-01-01 10:59"), dt("2024-01-01 10:00"), TimeUnit::Hour), 0);
    }

    #[test]
    fn add_rolls_over_like_a_calendar() {
        assert_eq!(add(dt("2024-01-31"), 1, TimeUnit::Month), dt("2024-03-02"));
        assert_eq!(add(dt("2024-12-15"), 1, TimeUnit::Month), dt("2025-01-15"));
        assert_eq!(add(dt("2024-03-01"), -1, TimeUnit::Month), dt("2024-02-01"));
        assert_eq!(add(dt("2024-02-29"), 1, TimeUnit::Year), dt("2025-03-01"));
        assert_eq!(add(dt("2024-03-01"), 24, TimeUnit::Hour), dt("2024-03-02"));
    }

    #[test]
    fn start_of_zeroes_finer_fields() {
        let d = dt("2024-05-17 13:45:10");
        assert_eq!(start_of(d, TimeUnit::Day), dt("2024-05-17"));
        assert_eq!(start_of(d, TimeUnit::Month), dt("2024-05-01"));
        assert_eq!(start_of(d, TimeUnit::Year), dt("2024-01-01"));
        assert_eq!(start_of(d, TimeUnit::Hour), dt("2024-05-17 13:00"));
        assert_eq!(start_of_quarter(d), dt("2024-04-01"));
    }

    #[test]
    fn period_lengths_handle_leap_years() {
        assert_eq!(days_in_month(dt("2024-02-10")), 29);
        assert_eq!(days_in_month(dt("2023-02-10")), 28);
        assert_eq!(days_in_month(dt("1900-02-10")), 28);
        assert_eq!(days_in_quarter(dt("2024-02-10")), 91);
        assert_eq!(days_in_quarter(dt("2023-11-10")), 92);
        assert_eq!(days_in_year(dt("2000-06-01")), 366);
    }

    #[test]
    fn duration_tokens() {
        assert_eq!(
            parse_duration("6d").unwrap(),
            DurationSpec { amount: 6, unit: TimeUnit::Day }
        );
        assert_eq!(parse_duration("15min").unwrap().unit, TimeUnit::Minute);
        assert_eq!(parse_duration("10ms").unwrap().amount, 10);
        assert!(parse_duration("d6").is_err());
        assert!(parse_duration("6w").is_err());
        assert_eq!(parse_durations("1d 12h").unwrap().len(), 2);
        assert_eq!("Hours".parse::<TimeUnit>().unwrap(), TimeUnit::Hour);
    }
}
