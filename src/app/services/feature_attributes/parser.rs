//! Feature-attribute protocol parser
//!
//! Comment lines of the form `# @VGMT1.0 @GPOLYGON`, `# @Nid|name`,
//! `# @Tinteger|string`, `# FEATURE_DATA` and `# @D7|"Alpha"` declare a
//! schema and per-feature values. The parser is a small state machine; a
//! file that breaks the protocol is downgraded to plain comments with a
//! warning and reading continues.

use tracing::{debug, warn};

use crate::app::models::{FeatureSchema, FeatureValues, FieldType, GeometryKind, PolygonRole, ProjectionFlavor};
use crate::app::services::value_scan::{Expectation, ValueScanner, parse_float};
use crate::constants::{COMMENT_CHAR, FEATURE_DATA_MARKER, FEATURE_FIELD_DELIMITER, FEATURE_SIGIL, FEATURE_VERSION_TAG};

/// Parse phase of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePhase {
    /// No protocol tag seen yet
    #[default]
    Unknown,
    /// Version tag seen, schema declarations accepted
    Header,
    /// End-of-header marker seen, per-feature values accepted
    Data,
    /// The file broke the protocol; comments pass through untouched
    Rejected,
}

/// What the parser did with one comment line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    /// Not part of the protocol
    PassThrough,
    /// Consumed as a schema declaration
    Declaration,
    /// The end-of-header marker
    DataStart,
    /// Values or a polygon role for the current feature
    Feature,
}

/// Split a tag argument on `|`, keeping quoted runs intact
pub(crate) fn split_fields(text: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == FEATURE_FIELD_DELIMITER => fields.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Split a comment body into `@` tags
///
/// A sigil starts a tag only at the beginning of the body or after
/// whitespace, and never inside quotes.
pub(crate) fn split_tags(body: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut previous: Option<char> = None;
    for c in body.chars() {
        let starts_tag =
            c == FEATURE_SIGIL && quote.is_none() && previous.is_none_or(|p| p.is_whitespace());
        if starts_tag {
            if let Some(tag) = current.take() {
                tags.push(tag.trim_end().to_string());
            }
            current = Some(String::new());
        } else if let Some(tag) = current.as_mut() {
            match quote {
                Some(open) if c == open => quote = None,
                None if c == '"' || c == '\'' => quote = Some(c),
                _ => {}
            }
            tag.push(c);
        }
        previous = Some(c);
    }
    if let Some(tag) = current {
        tags.push(tag.trim_end().to_string());
    }
    tags
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for q in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner;
        }
    }
    text
}

/// Feature-attribute parser for one stream
#[derive(Debug, Clone, Default)]
pub struct FeatureParser {
    phase: ParsePhase,
    schema: FeatureSchema,
    pending: Option<FeatureValues>,
    /// `(column, field name)` pairs whose values are injected into records
    requested: Vec<(usize, String)>,
    /// `(column, field index)` resolved at the end of the header
    lookup: Vec<(usize, usize)>,
    /// Drop features whose value count differs from the schema
    strict: bool,
    scanner: ValueScanner,
}

impl FeatureParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that field `name` replace data column `column`
    pub fn with_aspatial(mut self, mappings: Vec<(usize, String)>) -> Self {
        self.requested = mappings;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_scanner(mut self, scanner: ValueScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn phase(&self) -> ParsePhase {
        self.phase
    }

    /// The declared schema, once the version tag has been accepted
    pub fn schema(&self) -> Option<&FeatureSchema> {
        matches!(self.phase, ParsePhase::Header | ParsePhase::Data).then_some(&self.schema)
    }

    /// Take the values gathered for the current feature
    pub fn take_feature(&mut self) -> Option<FeatureValues> {
        let mut values = self.pending.take()?;
        // a role tag without `@D` leaves every field empty
        while values.len() < self.schema.field_count() {
            values.push(String::new(), f64::NAN);
        }
        Some(values)
    }

    /// Values of the current feature for the resolved aspatial columns
    pub fn aspatial_values(&self) -> Vec<(usize, f64)> {
        let Some(values) = self.pending.as_ref() else {
            return Vec::new();
        };
        self.lookup
            .iter()
            .filter_map(|&(col, field)| values.number(field).map(|v| (col, v)))
            .collect()
    }

    /// Feed one comment line
    pub fn process_comment(&mut self, line: &str) -> CommentOutcome {
        if self.phase == ParsePhase::Rejected {
            return CommentOutcome::PassThrough;
        }
        let Some(body) = line.trim_start().strip_prefix(COMMENT_CHAR) else {
            return CommentOutcome::PassThrough;
        };
        let body = body.trim();

        if body == FEATURE_DATA_MARKER {
            return match self.phase {
                ParsePhase::Header => {
                    self.begin_data();
                    CommentOutcome::DataStart
                }
                ParsePhase::Data => self.reject("end-of-header marker repeated"),
                _ => CommentOutcome::PassThrough,
            };
        }

        let tags = split_tags(body);
        if tags.is_empty() {
            return CommentOutcome::PassThrough;
        }
        let mut outcome = CommentOutcome::Declaration;
        for tag in tags {
            let mut chars = tag.chars();
            let Some(code) = chars.next() else {
                return self.reject("empty tag");
            };
            let arg = chars.as_str();
            let result = match self.phase {
                ParsePhase::Unknown => {
                    if tag == FEATURE_VERSION_TAG {
                        debug!("Feature-attribute header detected");
                        self.phase = ParsePhase::Header;
                        Ok(())
                    } else {
                        Err(format!("first tag '@{}' is not the version tag", tag))
                    }
                }
                ParsePhase::Header => self.declare(code, arg, &tag),
                ParsePhase::Data => {
                    outcome = CommentOutcome::Feature;
                    self.feature_tag(code, arg)
                }
                ParsePhase::Rejected => return CommentOutcome::PassThrough,
            };
            if let Err(reason) = result {
                return self.reject(&reason);
            }
        }
        outcome
    }

    fn reject(&mut self, reason: &str) -> CommentOutcome {
        warn!(
            "Feature-attribute metadata ignored from here on: {}",
            reason
        );
        self.phase = ParsePhase::Rejected;
        self.schema = FeatureSchema::default();
        self.pending = None;
        self.lookup.clear();
        CommentOutcome::PassThrough
    }

    fn declare(&mut self, code: char, arg: &str, tag: &str) -> std::result::Result<(), String> {
        match code {
            'V' if tag == FEATURE_VERSION_TAG => Ok(()),
            'G' => {
                let kind = GeometryKind::from_keyword(arg)
                    .ok_or_else(|| format!("unknown geometry '{}'", arg))?;
                match self.schema.geometry {
                    Some(existing) if existing != kind => {
                        Err(format!("geometry redeclared from {} to {}", existing, kind))
                    }
                    _ => {
                        self.schema.geometry = Some(kind);
                        Ok(())
                    }
                }
            }
            'N' => {
                let names = split_fields(arg);
                if !self.schema.names.is_empty() && self.schema.names != names {
                    return Err("field names redeclared".to_string());
                }
                if !self.schema.types.is_empty() && self.schema.types.len() != names.len() {
                    return Err(format!(
                        "{} field names for {} field types",
                        names.len(),
                        self.schema.types.len()
                    ));
                }
                self.schema.names = names;
                Ok(())
            }
            'T' => {
                let types = split_fields(arg)
                    .iter()
                    .map(|t| FieldType::from_name(t).ok_or_else(|| format!("unknown field type '{}'", t)))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                if !self.schema.types.is_empty() && self.schema.types != types {
                    return Err("field types redeclared".to_string());
                }
                if !self.schema.names.is_empty() && self.schema.names.len() != types.len() {
                    return Err(format!(
                        "{} field types for {} field names",
                        types.len(),
                        self.schema.names.len()
                    ));
                }
                self.schema.types = types;
                Ok(())
            }
            'R' => {
                self.schema.region = Some(arg.trim().to_string());
                Ok(())
            }
            'J' => {
                let mut chars = arg.chars();
                let flavor = chars
                    .next()
                    .and_then(ProjectionFlavor::from_letter)
                    .ok_or_else(|| format!("unknown projection flavor in '@J{}'", arg))?;
                self.schema.set_projection(flavor, unquote(chars.as_str()));
                Ok(())
            }
            'D' | 'P' | 'H' => Err(format!("'@{}' before the end-of-header marker", code)),
            _ => Err(format!("unknown tag '@{}'", tag)),
        }
    }

    fn begin_data(&mut self) {
        self.phase = ParsePhase::Data;
        self.lookup.clear();
        for (col, name) in &self.requested {
            match self.schema.field_index(name) {
                Some(index) => self.lookup.push((*col, index)),
                None => warn!("Aspatial field '{}' is not declared in the feature header", name),
            }
        }
        debug!(
            "Feature-attribute schema: {:?} with {} fields, {} aspatial columns",
            self.schema.geometry,
            self.schema.field_count(),
            self.lookup.len()
        );
    }

    fn feature_tag(&mut self, code: char, arg: &str) -> std::result::Result<(), String> {
        match code {
            'D' => {
                let role = self.pending.as_ref().map(|p| p.role).unwrap_or_default();
                let mut values = self.parse_values(arg);
                values.role = role;
                if let Some(values) = reconcile(values, self.schema.field_count(), self.strict) {
                    self.pending = Some(values);
                }
                Ok(())
            }
            'P' | 'H' => {
                if !self.schema.geometry.is_some_and(|g| g.is_polygon()) {
                    return Err(format!("'@{}' in a non-polygon file", code));
                }
                let values = self.pending.get_or_insert_with(FeatureValues::new);
                values.role = if code == 'H' {
                    PolygonRole::Hole
                } else {
                    PolygonRole::Perimeter
                };
                Ok(())
            }
            _ => Err(format!("'@{}' after the end-of-header marker", code)),
        }
    }

    fn parse_values(&self, arg: &str) -> FeatureValues {
        let mut values = FeatureValues::new();
        for (index, text) in split_fields(arg).into_iter().enumerate() {
            let number = match self.schema.field_type(index) {
                FieldType::DateTime => self
                    .scanner
                    .scan(&text, Expectation::AbsTime)
                    .map_or(f64::NAN, |s| s.value),
                t if t.is_numeric() => parse_float(&text).unwrap_or(f64::NAN),
                _ => f64::NAN,
            };
            values.push(text, number);
        }
        values
    }
}

/// Reconcile the value count of a feature with the schema
fn reconcile(mut values: FeatureValues, expected: usize, strict: bool) -> Option<FeatureValues> {
    let found = values.len();
    if found == expected {
        return Some(values);
    }
    if strict {
        warn!("Feature dropped: {} values for {} declared fields", found, expected);
        return None;
    }
    warn!(
        "Feature has {} values for {} declared fields; missing values are empty",
        found, expected
    );
    while values.len() < expected {
        values.push(String::new(), f64::NAN);
    }
    values.text.truncate(expected);
    values.numbers.truncate(expected);
    Some(values)
}
