//! Tests for output templates

use super::super::format::{ClockTemplate, DateTemplate, FloatTemplate, GeoFormat, ValueFormatter, format_general};
use super::super::scan::{parse_float, scan_geo};
use super::days_since_2000;
use crate::Error;
use crate::app::models::ColumnKind;
use chrono::NaiveDate;

#[test]
fn test_format_general_matches_c() {
    assert_eq!(format_general(0.0, 12), "0");
    assert_eq!(format_general(1.0, 12), "1");
    assert_eq!(format_general(0.1, 12), "0.1");
    assert_eq!(format_general(123456.789, 6), "123457");
    assert_eq!(format_general(1234567.0, 6), "1.23457e+06");
    assert_eq!(format_general(0.0001, 6), "0.0001");
    assert_eq!(format_general(0.00001, 6), "1e-05");
    assert_eq!(format_general(-2.5, 12), "-2.5");
    assert_eq!(format_general(f64::NAN, 12), "NaN");
}

#[test]
fn test_float_output_reparses() {
    let template = FloatTemplate::default();
    for token in ["0.1", "-17.25", "6.02214076e23", "1e-300", "42", "3.14159265359"] {
        let value = parse_float(token).unwrap();
        let text = template.format(value);
        assert_eq!(parse_float(&text).unwrap(), value, "{} -> {}", token, text);
    }
}

#[test]
fn test_float_templates() {
    assert_eq!(FloatTemplate::parse("%.3f").unwrap().format(2.0), "2.000");
    assert_eq!(FloatTemplate::parse("%8.2lf").unwrap().format(-1.5), "   -1.50");
    assert_eq!(FloatTemplate::parse("%.2e").unwrap().format(12345.0), "1.23e+04");
    assert_eq!(FloatTemplate::parse("%g").unwrap().format(0.5), "0.5");
    assert!(FloatTemplate::parse("%d").is_err());
}

#[test]
fn test_geo_dms_output() {
    let float = FloatTemplate::default();
    let dms = GeoFormat::parse("ddd:mm:ss").unwrap();
    assert_eq!(dms.format(-30.25, false, &float), "-30:15:00");
    assert_eq!(dms.format(-0.5, false, &float), "-0:30:00");

    let hemi = GeoFormat::parse("ddd:mm:ssF").unwrap();
    assert_eq!(hemi.format(-30.25, false, &float), "30:15:00W");
    assert_eq!(hemi.format(-12.5, true, &float), "12:30:00S");

    let spaced = GeoFormat::parse("ddd:mmG").unwrap();
    assert_eq!(spaced.format(10.5, true, &float), "10:30 N");
}

#[test]
fn test_geo_decimal_ranges() {
    let float = FloatTemplate::parse("%.1f").unwrap();
    let positive = GeoFormat::parse("+D").unwrap();
    assert!(positive.is_decimal());
    assert_eq!(positive.format(-90.0, false, &float), "270.0");
    let signed = GeoFormat::parse("D").unwrap();
    assert_eq!(signed.format(270.0, false, &float), "-90.0");
    assert_eq!(signed.format(95.0, true, &float), "95.0");
}

#[test]
fn test_geo_dms_round_trip_within_resolution() {
    let float = FloatTemplate::default();
    let format = GeoFormat::parse("ddd:mm:ss.xx").unwrap();
    let resolution = 0.01 / 3600.0;
    let mut v = -179.5;
    while v < 180.0 {
        let text = format.format(v, false, &float);
        let back = scan_geo(&text).unwrap().value;
        assert!((back - v).abs() <= resolution, "{} -> {} -> {}", v, text, back);
        v += 7.123456;
    }
}

#[test]
fn test_geo_template_errors() {
    assert!(GeoFormat::parse("dd:mm").is_err());
    assert!(GeoFormat::parse("ddd:mm:ss.yy").is_err());
    assert!(GeoFormat::parse("ddd:mm/ss").is_err());
}

#[test]
fn test_template_decimals_are_capped() {
    let float = FloatTemplate::default();
    let finest = GeoFormat::parse("ddd:mm:ss.xxxxxxxxx").unwrap();
    assert_eq!(finest.format(12.5, false, &float), "12:30:00.000000000");
    assert!(matches!(
        GeoFormat::parse("ddd:mm:ss.xxxxxxxxxxxxxxxxxxxx"),
        Err(Error::InvalidFormat { .. })
    ));

    assert!(ClockTemplate::parse("hh:mm:ss.xxxxxxxxx").is_ok());
    assert!(matches!(
        ClockTemplate::parse("hh:mm:ss.xxxxxxxxxx"),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn test_date_templates() {
    let day = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
    assert_eq!(DateTemplate::default().format(day), "2020-02-29");
    assert_eq!(DateTemplate::parse("yyyy-jjj").unwrap().format(day), "2020-060");
    assert_eq!(DateTemplate::parse("dd/mm/yy").unwrap().format(day), "29/02/20");
    assert_eq!(DateTemplate::parse("yyyy-Www-d").unwrap().format(day), "2020-W09-6");
    assert!(DateTemplate::parse("yyy-mm").is_err());
    assert!(DateTemplate::parse("--").is_err());
}

#[test]
fn test_clock_templates() {
    assert_eq!(ClockTemplate::default().format(3661.0), "01:01:01");
    assert_eq!(ClockTemplate::parse("hh:mm:ss.xxx").unwrap().format(3661.25), "01:01:01.250");
    assert_eq!(ClockTemplate::parse("hh:mm").unwrap().format(5400.0), "01:30");
    assert_eq!(ClockTemplate::parse("hh:mma").unwrap().format(13.5 * 3600.0), "01:30pm");
    assert_eq!(ClockTemplate::parse("hhA").unwrap().format(0.0), "12AM");
    assert!(ClockTemplate::parse("mm:ss").is_err());
}

#[test]
fn test_format_value_dispatch() {
    let mut formatter = ValueFormatter::default();
    formatter.time = days_since_2000();
    formatter.geo = GeoFormat::parse("ddd:mmF").unwrap();

    assert_eq!(formatter.format_value(f64::NAN, ColumnKind::Latitude), "NaN");
    assert_eq!(formatter.format_value(2.5, ColumnKind::Float), "2.5");
    assert_eq!(formatter.format_value(-10.5, ColumnKind::Longitude), "10:30W");
    assert_eq!(formatter.format_value(10.5, ColumnKind::AbsTime), "2000-01-11T12:00:00");
}

#[test]
fn test_unknown_axis_keeps_sign_and_range() {
    let mut formatter = ValueFormatter::default();
    formatter.geo = GeoFormat::parse("ddd:mmF").unwrap();
    assert_eq!(formatter.format_value(-10.5, ColumnKind::Geographic), "-10:30");
    assert_eq!(formatter.format_value(-10.5, ColumnKind::Longitude), "10:30W");

    formatter.geo = GeoFormat::parse("+D").unwrap();
    assert_eq!(formatter.format_value(-90.0, ColumnKind::Geographic), "-90");
    assert_eq!(formatter.format_value(-90.0, ColumnKind::Longitude), "270");
}

#[test]
fn test_abs_time_rounding_carries_into_next_day() {
    let formatter = ValueFormatter::default();
    assert_eq!(formatter.format_abs_time(86399.7), "1970-01-02T00:00:00");
}
