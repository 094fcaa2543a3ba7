//! Feature-attribute output
//!
//! Emits the header tags of a [`FeatureSchema`] and the per-feature value
//! and polygon-role lines, in the layout the parser reads back.

use crate::app::models::{FeatureSchema, FeatureValues, PolygonRole};
use crate::constants::{COMMENT_CHAR, FEATURE_DATA_MARKER, FEATURE_FIELD_DELIMITER, FEATURE_SIGIL, FEATURE_VERSION_TAG};

fn quote_if_needed(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text.contains(FEATURE_FIELD_DELIMITER)
        || text.chars().any(char::is_whitespace);
    if needs_quotes && !text.contains('"') {
        format!("\"{}\"", text)
    } else if needs_quotes {
        format!("'{}'", text)
    } else {
        text.to_string()
    }
}

fn join_fields<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .collect::<Vec<_>>()
        .join(&FEATURE_FIELD_DELIMITER.to_string())
}

/// Header lines declaring `schema`, ending with the end-of-header marker
pub fn header_lines(schema: &FeatureSchema) -> Vec<String> {
    let mut lines = Vec::new();
    let mut first = format!("{} {}{}", COMMENT_CHAR, FEATURE_SIGIL, FEATURE_VERSION_TAG);
    if let Some(geometry) = schema.geometry {
        first.push_str(&format!(" {}G{}", FEATURE_SIGIL, geometry.keyword()));
    }
    lines.push(first);

    for (flavor, text) in schema.projections() {
        lines.push(format!(
            "{} {}J{}\"{}\"",
            COMMENT_CHAR,
            FEATURE_SIGIL,
            flavor.letter(),
            text
        ));
    }
    if let Some(region) = &schema.region {
        lines.push(format!("{} {}R{}", COMMENT_CHAR, FEATURE_SIGIL, region));
    }
    if !schema.names.is_empty() {
        let names: Vec<String> = schema.names.iter().map(|n| quote_if_needed(n)).collect();
        lines.push(format!(
            "{} {}N{}",
            COMMENT_CHAR,
            FEATURE_SIGIL,
            join_fields(names.iter().map(String::as_str))
        ));
        lines.push(format!(
            "{} {}T{}",
            COMMENT_CHAR,
            FEATURE_SIGIL,
            join_fields((0..schema.field_count()).map(|i| schema.field_type(i).name()))
        ));
    }
    lines.push(format!("{} {}", COMMENT_CHAR, FEATURE_DATA_MARKER));
    lines
}

/// Lines describing one feature: its values, then its polygon role
pub fn feature_lines(schema: &FeatureSchema, values: &FeatureValues) -> Vec<String> {
    let mut lines = Vec::new();
    if !values.is_empty() {
        let quoted: Vec<String> = values.text.iter().map(|t| quote_if_needed(t)).collect();
        lines.push(format!(
            "{} {}D{}",
            COMMENT_CHAR,
            FEATURE_SIGIL,
            join_fields(quoted.iter().map(String::as_str))
        ));
    }
    if schema.geometry.is_some_and(|g| g.is_polygon()) {
        let code = match values.role {
            PolygonRole::Perimeter => 'P',
            PolygonRole::Hole => 'H',
        };
        lines.push(format!("{} {}{}", COMMENT_CHAR, FEATURE_SIGIL, code));
    }
    lines
}
