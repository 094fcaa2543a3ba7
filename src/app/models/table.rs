//! Table: an ordered sequence of segments plus table-scope metadata.

use std::path::PathBuf;

use tracing::debug;

use super::extent::LonQuadrants;
use super::segment::Segment;
use super::{ColumnKind, FeatureSchema, LonRange, PolygonRole, update_min_max};

/// One table of segments
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub id: usize,
    /// Header lines, verbatim
    pub header: Vec<String>,
    n_columns: usize,
    segments: Vec<Segment>,
    min: Vec<f64>,
    max: Vec<f64>,
    /// Feature-attribute schema, when the source used that protocol
    pub schema: Option<FeatureSchema>,
    /// Output file name overriding the dataset template
    pub output_file: Option<PathBuf>,
}

impl Table {
    /// Create an empty table for `n_columns` columns
    pub fn new(n_columns: usize) -> Self {
        Self {
            n_columns,
            min: vec![f64::NAN; n_columns],
            max: vec![f64::NAN; n_columns],
            ..Default::default()
        }
    }

    /// Create an empty table with room for `n_segments` segments
    pub fn with_capacity(n_columns: usize, n_segments: usize) -> Self {
        let mut table = Self::new(n_columns);
        table.segments.reserve_exact(n_segments);
        table
    }

    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    /// Total rows across all segments
    pub fn n_records(&self) -> usize {
        self.segments.iter().map(Segment::n_rows).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments that fit before the next reallocation
    pub fn segment_capacity(&self) -> usize {
        self.segments.capacity()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Append a segment, doubling the segment capacity when full
    pub fn push_segment(&mut self, segment: Segment) {
        if self.segments.len() == self.segments.capacity() {
            let additional = self.segments.capacity().max(1);
            self.segments.reserve_exact(additional);
        }
        if self.n_columns == 0 {
            self.set_column_count(segment.n_columns());
        }
        self.segments.push(segment);
    }

    /// Remove and return the segment at `index`
    ///
    /// Perimeter links of later holes are shifted to stay valid.
    pub fn remove_segment(&mut self, index: usize) -> Option<Segment> {
        if index >= self.segments.len() {
            return None;
        }
        let removed = self.segments.remove(index);
        for segment in &mut self.segments {
            segment.perimeter = match segment.perimeter {
                Some(p) if p == index => None,
                Some(p) if p > index => Some(p - 1),
                other => other,
            };
        }
        Some(removed)
    }

    /// Change the column count of the table and every segment
    pub fn set_column_count(&mut self, n_columns: usize) {
        for segment in &mut self.segments {
            segment.set_column_count(n_columns);
        }
        self.n_columns = n_columns;
        self.min.resize(n_columns, f64::NAN);
        self.max.resize(n_columns, f64::NAN);
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Recompute segment and table min/max
    ///
    /// The table extent aggregates segment extents; longitude columns pool
    /// the quadrant votes of all segments.
    pub fn compute_min_max(&mut self, kinds: &[ColumnKind], default_range: LonRange) {
        self.min = vec![f64::NAN; self.n_columns];
        self.max = vec![f64::NAN; self.n_columns];
        let mut quadrants: Vec<Option<LonQuadrants>> = (0..self.n_columns)
            .map(|col| (kinds.get(col) == Some(&ColumnKind::Longitude)).then(LonQuadrants::new))
            .collect();

        for segment in &mut self.segments {
            segment.compute_min_max(kinds, default_range);
            for col in 0..self.n_columns.min(segment.n_columns()) {
                match quadrants[col].as_mut() {
                    Some(q) if segment.lon_override.is_none() => {
                        q.merge(&segment.lon_quadrants(col));
                    }
                    _ => {
                        update_min_max(&mut self.min[col], &mut self.max[col], segment.min()[col]);
                        update_min_max(&mut self.min[col], &mut self.max[col], segment.max()[col]);
                    }
                }
            }
        }

        for (col, q) in quadrants.iter().enumerate() {
            if let Some((lo, hi)) = q.as_ref().and_then(|q| q.finalize(default_range)) {
                update_min_max(&mut self.min[col], &mut self.max[col], lo);
                update_min_max(&mut self.min[col], &mut self.max[col], hi);
            }
        }
        debug!(
            "Table {} extent over {} segments: min={:?} max={:?}",
            self.id,
            self.segments.len(),
            self.min,
            self.max
        );
    }

    /// Point each hole at its immediately preceding perimeter
    ///
    /// Holes with no preceding perimeter keep `perimeter == None`.
    pub fn link_holes(&mut self) {
        let mut last_perimeter = None;
        for (index, segment) in self.segments.iter_mut().enumerate() {
            match segment.role {
                PolygonRole::Perimeter => {
                    segment.perimeter = None;
                    last_perimeter = Some(index);
                }
                PolygonRole::Hole => segment.perimeter = last_perimeter,
            }
        }
    }

    /// Holes linked to the perimeter at `index`
    pub fn holes_of(&self, index: usize) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(move |s| s.role == PolygonRole::Hole && s.perimeter == Some(index))
    }

    /// Copy of the table; without `copy_data` the values are zeroed
    pub(crate) fn duplicate(&self, copy_data: bool) -> Self {
        Self {
            id: self.id,
            header: self.header.clone(),
            n_columns: self.n_columns,
            segments: self.segments.iter().map(|s| s.duplicate(copy_data)).collect(),
            min: if copy_data { self.min.clone() } else { vec![f64::NAN; self.n_columns] },
            max: if copy_data { self.max.clone() } else { vec![f64::NAN; self.n_columns] },
            schema: self.schema.clone(),
            output_file: self.output_file.clone(),
        }
    }

    pub(crate) fn into_segments(self) -> Vec<Segment> {
        self.segments
    }
}
