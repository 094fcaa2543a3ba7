//! Feature-attribute ("aspatial") data types.
//!
//! A table may carry a [`FeatureSchema`] describing geometry and named typed
//! fields; each segment of such a table carries [`FeatureValues`] with one
//! entry per schema field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry kind declared by a feature-attribute header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl GeometryKind {
    /// Parse a geometry keyword (case-insensitive)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_uppercase().as_str() {
            "POINT" => Some(GeometryKind::Point),
            "MULTIPOINT" => Some(GeometryKind::MultiPoint),
            "LINESTRING" => Some(GeometryKind::LineString),
            "MULTILINESTRING" => Some(GeometryKind::MultiLineString),
            "POLYGON" => Some(GeometryKind::Polygon),
            "MULTIPOLYGON" => Some(GeometryKind::MultiPolygon),
            _ => None,
        }
    }

    /// Keyword used when writing the geometry tag
    pub fn keyword(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
        }
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Declared type of a feature-attribute field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Double,
    Float,
    Integer,
    Char,
    String,
    DateTime,
    Logical,
}

impl FieldType {
    /// Map a type name from an `@T` tag (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "double" => Some(FieldType::Double),
            "float" => Some(FieldType::Float),
            "integer" => Some(FieldType::Integer),
            "char" => Some(FieldType::Char),
            "string" => Some(FieldType::String),
            "datetime" => Some(FieldType::DateTime),
            "logical" => Some(FieldType::Logical),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::Char => "char",
            FieldType::String => "string",
            FieldType::DateTime => "datetime",
            FieldType::Logical => "logical",
        }
    }

    /// Whether values of this type have a meaningful numeric reading
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Double | FieldType::Float | FieldType::Integer | FieldType::Logical
        )
    }
}

/// Projection representation flavor of an `@J` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectionFlavor {
    /// `e`: EPSG code
    Epsg,
    /// `g`: GMT projection string
    Gmt,
    /// `p`: Proj.4 string
    Proj4,
    /// `w`: OGC WKT
    Wkt,
}

impl ProjectionFlavor {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'e' => Some(ProjectionFlavor::Epsg),
            'g' => Some(ProjectionFlavor::Gmt),
            'p' => Some(ProjectionFlavor::Proj4),
            'w' => Some(ProjectionFlavor::Wkt),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            ProjectionFlavor::Epsg => 'e',
            ProjectionFlavor::Gmt => 'g',
            ProjectionFlavor::Proj4 => 'p',
            ProjectionFlavor::Wkt => 'w',
        }
    }

    fn index(&self) -> usize {
        match self {
            ProjectionFlavor::Epsg => 0,
            ProjectionFlavor::Gmt => 1,
            ProjectionFlavor::Proj4 => 2,
            ProjectionFlavor::Wkt => 3,
        }
    }

    pub const ALL: [ProjectionFlavor; 4] = [
        ProjectionFlavor::Epsg,
        ProjectionFlavor::Gmt,
        ProjectionFlavor::Proj4,
        ProjectionFlavor::Wkt,
    ];
}

/// Role of a polygon segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolygonRole {
    #[default]
    Perimeter,
    Hole,
}

/// Table-scope description of feature attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub geometry: Option<GeometryKind>,
    pub names: Vec<String>,
    pub types: Vec<FieldType>,
    pub region: Option<String>,
    projections: [Option<String>; 4],
}

impl FeatureSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared fields
    pub fn field_count(&self) -> usize {
        self.names.len().max(self.types.len())
    }

    /// Position of a field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Type of the field at `index`, `String` when undeclared
    pub fn field_type(&self, index: usize) -> FieldType {
        self.types.get(index).copied().unwrap_or(FieldType::String)
    }

    pub fn projection(&self, flavor: ProjectionFlavor) -> Option<&str> {
        self.projections[flavor.index()].as_deref()
    }

    pub fn set_projection(&mut self, flavor: ProjectionFlavor, text: impl Into<String>) {
        self.projections[flavor.index()] = Some(text.into());
    }

    /// Declared projections in flavor order
    pub fn projections(&self) -> impl Iterator<Item = (ProjectionFlavor, &str)> {
        ProjectionFlavor::ALL
            .into_iter()
            .filter_map(|f| self.projection(f).map(|p| (f, p)))
    }
}

/// Segment-scope feature-attribute values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureValues {
    /// Values as they appeared in the `@D` tag
    pub text: Vec<String>,
    /// Numeric reading of each value (NaN when not numeric)
    pub numbers: Vec<f64>,
    pub role: PolygonRole,
}

impl FeatureValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append one value
    pub fn push(&mut self, text: impl Into<String>, number: f64) {
        self.text.push(text.into());
        self.numbers.push(number);
    }

    /// Text of the value at `index`
    pub fn text(&self, index: usize) -> Option<&str> {
        self.text.get(index).map(String::as_str)
    }

    /// Numeric reading of the value at `index`
    pub fn number(&self, index: usize) -> Option<f64> {
        self.numbers.get(index).copied()
    }

    /// Look a value up by field name through the schema
    pub fn by_name<'a>(&'a self, schema: &FeatureSchema, name: &str) -> Option<(&'a str, f64)> {
        let index = schema.field_index(name)?;
        Some((self.text(index)?, self.number(index)?))
    }
}
