//! Tests for calendar and clock handling

use chrono::NaiveDate;

use super::super::time::{TimeSystem, scan_clock};
use super::days_since_2000;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_calendar_forms() {
    let time = TimeSystem::default();
    assert_eq!(time.scan_calendar("2020-03-15").unwrap(), date(2020, 3, 15));
    assert_eq!(time.scan_calendar("2020-03").unwrap(), date(2020, 3, 1));
    assert_eq!(time.scan_calendar("2020").unwrap(), date(2020, 1, 1));
    assert_eq!(time.scan_calendar("2020-060").unwrap(), date(2020, 2, 29));
    assert_eq!(time.scan_calendar("2020-W01-1").unwrap(), date(2019, 12, 30));
    assert_eq!(time.scan_calendar("2009-W53-7").unwrap(), date(2010, 1, 3));
}

#[test]
fn test_calendar_range_rules() {
    let time = TimeSystem::default();
    assert!(time.scan_calendar("2021-02-29").is_err());
    assert!(time.scan_calendar("2020-13-01").is_err());
    assert!(time.scan_calendar("2020-W54-1").is_err());
    assert!(time.scan_calendar("2020-W10-8").is_err());
    assert!(time.scan_calendar("2021-366").is_err());
}

#[test]
fn test_two_digit_year_window() {
    let time = TimeSystem::default();
    assert_eq!(time.expand_year(49), 2049);
    assert_eq!(time.expand_year(50), 1950);
    assert_eq!(time.scan_calendar("99-12-31").unwrap(), date(1999, 12, 31));
    assert_eq!(time.scan_calendar("07-01-02").unwrap(), date(2007, 1, 2));
}

#[test]
fn test_clock_forms() {
    assert_eq!(scan_clock("12").unwrap(), 43200.0);
    assert_eq!(scan_clock("01:30").unwrap(), 5400.0);
    assert_eq!(scan_clock("23:59:59.5").unwrap(), 86399.5);
    assert_eq!(scan_clock("23:59:60").unwrap(), 86400.0);
    assert!(scan_clock("24:00:01").is_err());
    assert!(scan_clock("10:61").is_err());
}

#[test]
fn test_twelve_hour_clock() {
    assert_eq!(scan_clock("12:00am").unwrap(), 0.0);
    assert_eq!(scan_clock("12:00PM").unwrap(), 43200.0);
    assert_eq!(scan_clock("1:15p.m.").unwrap(), 13.0 * 3600.0 + 900.0);
    assert!(scan_clock("13:00pm").is_err());
}

#[test]
fn test_abs_time_in_configured_unit() {
    let time = days_since_2000();
    assert_eq!(time.scan_abs_time("2000-01-11T12:00:00").unwrap(), 10.5);
    assert_eq!(time.scan_abs_time("1999-12-31T").unwrap(), -1.0);
    assert_eq!(time.scan_abs_time("T06").unwrap(), 0.25);
    assert!(time.scan_abs_time("2000-01-11").is_err());
}

#[test]
fn test_to_calendar_inverts_to_relative() {
    let time = days_since_2000();
    let value = time.to_relative(date(2012, 7, 4), 3600.0);
    let (d, seconds) = time.to_calendar(value).unwrap();
    assert_eq!(d, date(2012, 7, 4));
    assert!((seconds - 3600.0).abs() < 1e-6);
    assert!(time.to_calendar(f64::NAN).is_none());
}
