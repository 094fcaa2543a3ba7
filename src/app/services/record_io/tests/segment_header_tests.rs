//! Tests for segment header directives

use super::super::segment_header::{SegmentDirectives, StyleSetting};
use crate::app::models::PolygonRole;

#[test]
fn test_style_settings() {
    let d = SegmentDirectives::parse("-W1p,red -G- survey line");
    assert_eq!(d.pen, Some(StyleSetting::Set("1p,red".to_string())));
    assert_eq!(d.fill, Some(StyleSetting::Off));

    let d = SegmentDirectives::parse("-G -W");
    assert_eq!(d.fill, Some(StyleSetting::Default));
    assert_eq!(d.pen, Some(StyleSetting::Default));
}

#[test]
fn test_z_value_forms() {
    assert_eq!(SegmentDirectives::parse("-Z12.5").z, Some(12.5));
    assert_eq!(SegmentDirectives::parse("-Z -3").z, Some(-3.0));
    assert!(SegmentDirectives::parse("-Z NaN").z.unwrap().is_nan());
    assert!(SegmentDirectives::parse("-ZNaN").z.unwrap().is_nan());
    assert_eq!(SegmentDirectives::parse("-Z").z, None);
}

#[test]
fn test_quoted_label_keeps_spaces() {
    let d = SegmentDirectives::parse(r#"-L"Line A west" -D12.5"#);
    assert_eq!(d.label.as_deref(), Some("Line A west"));
    assert_eq!(d.distance, Some(12.5));

    let d = SegmentDirectives::parse("-Lplain");
    assert_eq!(d.label.as_deref(), Some("plain"));
}

#[test]
fn test_polygon_role() {
    assert_eq!(SegmentDirectives::parse("-P").role, Some(PolygonRole::Perimeter));
    assert_eq!(SegmentDirectives::parse("-Ph").role, Some(PolygonRole::Hole));
    assert_eq!(SegmentDirectives::parse("-Px").role, None);
}

#[test]
fn test_plain_text_has_no_directives() {
    assert!(SegmentDirectives::parse("track 7 of survey").is_empty());
    assert!(SegmentDirectives::parse("").is_empty());
    assert!(SegmentDirectives::parse("a-Gb").is_empty());
}
