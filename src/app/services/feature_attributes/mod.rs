//! Feature-attribute ("aspatial") metadata protocol
//!
//! Tables may declare a geometry kind and a list of named, typed fields in
//! `@`-tagged comment lines; each segment then carries one value per field.
//!
//! - [`parser`] - Phase-tracking parser for header and data comment lines
//! - [`writer`] - The inverse, used when writing tables

pub mod parser;
pub mod writer;

#[cfg(test)]
pub mod tests;

pub use parser::{CommentOutcome, FeatureParser, ParsePhase};
pub use writer::{feature_lines, header_lines};
