//! Core data structures for geospatial tables.
//!
//! Defines the Segment/Table/Dataset containment hierarchy, the semantic
//! column kinds that drive scanning and formatting, longitude framings and
//! the feature-attribute types attached to tables and segments.

pub mod attributes;
pub mod dataset;
pub mod extent;
pub mod segment;
pub mod table;

use serde::{Deserialize, Serialize};

pub use attributes::{
    FeatureSchema, FeatureValues, FieldType, GeometryKind, PolygonRole, ProjectionFlavor,
};
pub use dataset::{AllocationMode, Dataset, DuplicateOptions, Layout, WriteMode};
pub use extent::LonQuadrants;
pub use segment::{PoleCap, Segment};
pub use table::Table;

/// Semantic kind of a data column
///
/// Scanning and formatting dispatch on this; plain numbers are `Float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Float,
    Longitude,
    Latitude,
    /// Geographic coordinate whose axis is not known
    Geographic,
    AbsTime,
    RelTime,
    Dimension,
}

impl ColumnKind {
    /// Whether values of this kind are geographic coordinates
    pub fn is_geographic(&self) -> bool {
        matches!(
            self,
            ColumnKind::Longitude | ColumnKind::Latitude | ColumnKind::Geographic
        )
    }

    /// Whether values of this kind are time values
    pub fn is_time(&self) -> bool {
        matches!(self, ColumnKind::AbsTime | ColumnKind::RelTime)
    }
}

/// Framing used to report longitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LonRange {
    /// -180 <= lon < 180
    #[default]
    #[serde(rename = "-180/180")]
    Minus180To180,
    /// 0 <= lon < 360
    #[serde(rename = "0/360")]
    ZeroTo360,
}

impl LonRange {
    /// Move a longitude into this framing
    pub fn adjust(&self, lon: f64) -> f64 {
        if lon.is_nan() {
            return lon;
        }
        match self {
            LonRange::Minus180To180 => {
                let mut x = lon;
                while x >= 180.0 {
                    x -= 360.0;
                }
                while x < -180.0 {
                    x += 360.0;
                }
                x
            }
            LonRange::ZeroTo360 => {
                let mut x = lon;
                while x >= 360.0 {
                    x -= 360.0;
                }
                while x < 0.0 {
                    x += 360.0;
                }
                x
            }
        }
    }
}

/// Fold a value into a running min/max pair, ignoring NaN
#[inline]
pub(crate) fn update_min_max(min: &mut f64, max: &mut f64, value: f64) {
    if value.is_nan() {
        return;
    }
    if min.is_nan() || value < *min {
        *min = value;
    }
    if max.is_nan() || value > *max {
        *max = value;
    }
}
