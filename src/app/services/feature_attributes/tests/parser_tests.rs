//! Tests for the feature-attribute parser

use super::super::parser::{CommentOutcome, FeatureParser, ParsePhase, split_fields, split_tags};
use super::parse_lines;
use crate::app::models::{FieldType, GeometryKind, PolygonRole, ProjectionFlavor};

#[test]
fn test_split_fields_is_quote_aware() {
    assert_eq!(split_fields("a|b|c"), vec!["a", "b", "c"]);
    assert_eq!(split_fields("\"x|y\"|'z w'"), vec!["x|y", "z w"]);
    assert_eq!(split_fields("7||"), vec!["7", "", ""]);
}

#[test]
fn test_split_tags_requires_whitespace_before_sigil() {
    assert_eq!(split_tags("@VGMT1.0 @GPOINT"), vec!["VGMT1.0", "GPOINT"]);
    assert_eq!(split_tags("@D\"a @b\"|c"), vec!["D\"a @b\"|c"]);
    assert!(split_tags("mail me@example.com").is_empty());
}

#[test]
fn test_header_then_values() {
    let mut parser = parse_lines(
        FeatureParser::new(),
        &["# @VGMT1.0 @GPOINT", "# @Nid|name", "# @Tinteger|string"],
    );
    assert_eq!(parser.phase(), ParsePhase::Header);
    assert_eq!(parser.process_comment("# FEATURE_DATA"), CommentOutcome::DataStart);
    assert_eq!(parser.process_comment("# @D7|Alpha"), CommentOutcome::Feature);

    let schema = parser.schema().unwrap().clone();
    assert_eq!(schema.geometry, Some(GeometryKind::Point));
    assert_eq!(schema.types, vec![FieldType::Integer, FieldType::String]);

    let values = parser.take_feature().unwrap();
    assert_eq!(values.by_name(&schema, "id").unwrap().1, 7.0);
    assert_eq!(values.by_name(&schema, "name").unwrap().0, "Alpha");
    assert!(parser.take_feature().is_none());
}

#[test]
fn test_region_and_projections() {
    let parser = parse_lines(
        FeatureParser::new(),
        &[
            "# @VGMT1.0 @GPOLYGON",
            "# @R-10/10/-5/5",
            "# @Jp\"+proj=longlat +datum=WGS84\"",
            "# @Je4326",
        ],
    );
    let schema = parser.schema().unwrap();
    assert_eq!(schema.region.as_deref(), Some("-10/10/-5/5"));
    assert_eq!(
        schema.projection(ProjectionFlavor::Proj4),
        Some("+proj=longlat +datum=WGS84")
    );
    assert_eq!(schema.projection(ProjectionFlavor::Epsg), Some("4326"));
}

#[test]
fn test_polygon_roles() {
    let mut parser = parse_lines(
        FeatureParser::new(),
        &["# @VGMT1.0 @GPOLYGON", "# @Nname", "# @Tstring", "# FEATURE_DATA"],
    );
    parser.process_comment("# @H");
    parser.process_comment("# @Dinner");
    let hole = parser.take_feature().unwrap();
    assert_eq!(hole.role, PolygonRole::Hole);
    assert_eq!(hole.text(0), Some("inner"));

    parser.process_comment("# @P");
    assert_eq!(parser.take_feature().unwrap().role, PolygonRole::Perimeter);
}

#[test]
fn test_short_value_list_is_padded() {
    let mut parser = parse_lines(
        FeatureParser::new(),
        &["# @VGMT1.0 @GPOINT", "# @Na|b|c", "# @Tdouble|string|double", "# FEATURE_DATA"],
    );
    parser.process_comment("# @D1.5");
    let values = parser.take_feature().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values.number(0), Some(1.5));
    assert_eq!(values.text(1), Some(""));
    assert!(values.number(2).unwrap().is_nan());
    assert_eq!(parser.phase(), ParsePhase::Data);
}

#[test]
fn test_role_without_values_is_padded() {
    let mut parser = parse_lines(
        FeatureParser::new(),
        &["# @VGMT1.0 @GPOLYGON", "# @Nname|area", "# @Tstring|double", "# FEATURE_DATA"],
    );
    parser.process_comment("# @H");
    let values = parser.take_feature().unwrap();
    assert_eq!(values.role, PolygonRole::Hole);
    assert_eq!(values.len(), 2);
    assert_eq!(values.text(0), Some(""));
    assert!(values.number(1).unwrap().is_nan());
}

#[test]
fn test_strict_mode_drops_mismatched_feature() {
    let mut parser = parse_lines(
        FeatureParser::new().with_strict(true),
        &["# @VGMT1.0 @GPOINT", "# @Na|b", "# @Tdouble|double", "# FEATURE_DATA"],
    );
    parser.process_comment("# @D1");
    assert!(parser.take_feature().is_none());
}

#[test]
fn test_violations_reject_the_file() {
    let cases: [&[&str]; 6] = [
        &["# @GPOINT"],
        &["# @VGMT1.0 @GCIRCLE"],
        &["# @VGMT1.0 @GPOINT", "# @GPOLYGON"],
        &["# @VGMT1.0", "# @Na|b", "# @Tdouble"],
        &["# @VGMT1.0", "# @D1"],
        &["# @VGMT1.0 @GPOINT", "# FEATURE_DATA", "# @Nlate"],
    ];
    for lines in cases {
        let mut parser = parse_lines(FeatureParser::new(), lines);
        assert_eq!(parser.phase(), ParsePhase::Rejected, "{:?}", lines);
        assert!(parser.schema().is_none());
        assert_eq!(parser.process_comment("# @VGMT1.0"), CommentOutcome::PassThrough);
    }
}

#[test]
fn test_role_in_non_polygon_file_rejects() {
    let parser = parse_lines(
        FeatureParser::new(),
        &["# @VGMT1.0 @GLINESTRING", "# FEATURE_DATA", "# @H"],
    );
    assert_eq!(parser.phase(), ParsePhase::Rejected);
}

#[test]
fn test_plain_comments_pass_through() {
    let mut parser = FeatureParser::new();
    assert_eq!(parser.process_comment("# just a comment"), CommentOutcome::PassThrough);
    assert_eq!(parser.process_comment("# FEATURE_DATA"), CommentOutcome::PassThrough);
    assert_eq!(parser.phase(), ParsePhase::Unknown);
}

#[test]
fn test_aspatial_lookup_resolved_at_data_start() {
    let mut parser = parse_lines(
        FeatureParser::new().with_aspatial(vec![(2, "depth".to_string()), (3, "missing".to_string())]),
        &["# @VGMT1.0 @GPOINT", "# @Nname|depth", "# @Tstring|double", "# FEATURE_DATA"],
    );
    parser.process_comment("# @DA|12.5");
    assert_eq!(parser.aspatial_values(), vec![(2, 12.5)]);
}

#[test]
fn test_datetime_fields_scan_as_time() {
    let mut parser = parse_lines(
        FeatureParser::new(),
        &["# @VGMT1.0 @GPOINT", "# @Nwhen", "# @Tdatetime", "# FEATURE_DATA"],
    );
    parser.process_comment("# @D1970-01-02T00:00:00");
    assert_eq!(parser.take_feature().unwrap().number(0), Some(86400.0));
}
