//! Tests for the feature-attribute protocol

use super::parser::FeatureParser;

mod parser_tests;

/// Feed lines to a parser, returning it for inspection
pub fn parse_lines(mut parser: FeatureParser, lines: &[&str]) -> FeatureParser {
    for line in lines {
        parser.process_comment(line);
    }
    parser
}
