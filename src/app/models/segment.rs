//! Segment: one contiguous run of records sharing a geometry identity.
//!
//! Column arrays are allocated lazily and always share one row count. The
//! row capacity is tracked explicitly so growth by doubling and the final
//! trim to the exact row count are observable.

use std::path::PathBuf;

use super::extent::LonQuadrants;
use super::{ColumnKind, FeatureValues, LonRange, PolygonRole, update_min_max};

/// Pole enclosed by a polar-cap polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoleCap {
    #[default]
    None,
    North,
    South,
}

/// One segment of a table
#[derive(Debug, Clone, Default)]
pub struct Segment {
    columns: Vec<Vec<f64>>,
    n_rows: usize,
    row_capacity: usize,
    min: Vec<f64>,
    max: Vec<f64>,
    /// Header text with the marker and leading whitespace removed
    pub header: Option<String>,
    /// Label taken from a `-L` header directive
    pub label: Option<String>,
    /// Feature-attribute values for this feature
    pub attributes: Option<FeatureValues>,
    pub role: PolygonRole,
    /// Output file name overriding the dataset template
    pub output_file: Option<PathBuf>,
    pub pole: PoleCap,
    /// Explicit `(min, max)` longitude override for polar caps
    pub lon_override: Option<(f64, f64)>,
    /// Index of the enclosing perimeter within the owning table (holes only)
    pub perimeter: Option<usize>,
    /// Distance hint taken from a `-D` header directive
    pub distance_hint: Option<f64>,
}

impl Segment {
    /// Create an empty segment with no columns allocated
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a segment with `n_columns` zero-filled columns of `n_rows` rows
    pub fn with_shape(n_columns: usize, n_rows: usize) -> Self {
        let mut segment = Self::new();
        segment.allocate_columns(n_columns);
        segment.resize_rows(n_rows);
        segment
    }

    /// Build a segment from complete column arrays
    ///
    /// Returns `None` when the columns differ in length.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Option<Self> {
        let n_rows = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != n_rows) {
            return None;
        }
        let n_columns = columns.len();
        let mut segment = Self {
            columns,
            n_rows,
            row_capacity: n_rows,
            min: vec![f64::NAN; n_columns],
            max: vec![f64::NAN; n_columns],
            ..Default::default()
        };
        segment.recompute_running_min_max();
        Some(segment)
    }

    /// Allocate `n_columns` empty columns if none exist yet
    ///
    /// Idempotent: calling again on an allocated segment changes nothing.
    pub fn allocate_columns(&mut self, n_columns: usize) {
        if !self.columns.is_empty() {
            return;
        }
        self.columns = (0..n_columns)
            .map(|_| Vec::with_capacity(self.row_capacity))
            .collect();
        self.min = vec![f64::NAN; n_columns];
        self.max = vec![f64::NAN; n_columns];
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Number of rows the column arrays can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.row_capacity
    }

    /// Grow the row capacity to at least `new_capacity`, keeping content
    pub fn grow_rows(&mut self, new_capacity: usize) {
        if new_capacity <= self.row_capacity {
            return;
        }
        for column in &mut self.columns {
            column.reserve_exact(new_capacity - column.len());
        }
        self.row_capacity = new_capacity;
    }

    /// Set the row count, zero-filling new rows or truncating
    pub fn resize_rows(&mut self, n_rows: usize) {
        for column in &mut self.columns {
            column.resize(n_rows, 0.0);
        }
        self.n_rows = n_rows;
        self.row_capacity = self.row_capacity.max(n_rows);
    }

    /// Trim the capacity to the actual row count
    pub fn shrink_to_fit(&mut self) {
        for column in &mut self.columns {
            column.shrink_to_fit();
        }
        self.row_capacity = self.n_rows;
    }

    /// Append one row, updating the running min/max
    ///
    /// Columns are allocated on first use. Missing trailing values are
    /// stored as NaN and extra values are ignored. Capacity doubles when full.
    pub fn push_row(&mut self, values: &[f64]) {
        if self.columns.is_empty() {
            self.allocate_columns(values.len());
        }
        if self.n_rows >= self.row_capacity {
            self.grow_rows((self.row_capacity * 2).max(self.n_rows + 1));
        }
        for (col, column) in self.columns.iter_mut().enumerate() {
            let value = values.get(col).copied().unwrap_or(f64::NAN);
            column.push(value);
            update_min_max(&mut self.min[col], &mut self.max[col], value);
        }
        self.n_rows += 1;
    }

    /// Remove the last row
    pub fn pop_row(&mut self) -> Option<Vec<f64>> {
        if self.n_rows == 0 {
            return None;
        }
        self.n_rows -= 1;
        self.columns.iter_mut().map(|c| c.pop()).collect()
    }

    /// All values of one column
    pub fn column(&self, col: usize) -> Option<&[f64]> {
        self.columns.get(col).map(Vec::as_slice)
    }

    pub fn column_mut(&mut self, col: usize) -> Option<&mut [f64]> {
        self.columns.get_mut(col).map(Vec::as_mut_slice)
    }

    /// Value at `(row, col)`
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col).and_then(|c| c.get(row)).copied()
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: f64) {
        if let Some(cell) = self.columns.get_mut(col).and_then(|c| c.get_mut(row)) {
            *cell = value;
        }
    }

    /// Copy of one row across all columns
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.n_rows {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row]).collect())
    }

    /// Change the number of columns, keeping the row count
    ///
    /// Excess columns are dropped; new columns are zero-filled.
    pub fn set_column_count(&mut self, n_columns: usize) {
        let n_rows = self.n_rows;
        if n_columns < self.columns.len() {
            self.columns.truncate(n_columns);
            self.min.truncate(n_columns);
            self.max.truncate(n_columns);
        } else {
            while self.columns.len() < n_columns {
                let mut column = Vec::with_capacity(self.row_capacity.max(n_rows));
                column.resize(n_rows, 0.0);
                self.columns.push(column);
                let (lo, hi) = if n_rows > 0 { (0.0, 0.0) } else { (f64::NAN, f64::NAN) };
                self.min.push(lo);
                self.max.push(hi);
            }
        }
    }

    /// Minimum of each column as of the last update
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Maximum of each column as of the last update
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    fn recompute_running_min_max(&mut self) {
        for (col, column) in self.columns.iter().enumerate() {
            let (mut lo, mut hi) = (f64::NAN, f64::NAN);
            for &v in column {
                update_min_max(&mut lo, &mut hi, v);
            }
            self.min[col] = lo;
            self.max[col] = hi;
        }
    }

    /// Recompute per-column min/max
    ///
    /// Longitude columns use quadrant voting so extents crossing Greenwich
    /// or the antimeridian are reported compactly. A polar-cap override
    /// replaces the longitude extent with the full turn.
    pub fn compute_min_max(&mut self, kinds: &[ColumnKind], default_range: LonRange) {
        self.recompute_running_min_max();
        for (col, column) in self.columns.iter().enumerate() {
            if kinds.get(col) != Some(&ColumnKind::Longitude) {
                continue;
            }
            if let Some((lo, hi)) = self.lon_override {
                self.min[col] = lo;
                self.max[col] = hi;
                continue;
            }
            let mut quadrants = LonQuadrants::new();
            for &lon in column {
                quadrants.add(lon);
            }
            if let Some((lo, hi)) = quadrants.finalize(default_range) {
                self.min[col] = lo;
                self.max[col] = hi;
            }
        }
        if self.pole != PoleCap::None {
            if let Some(lat_col) = kinds.iter().position(|k| *k == ColumnKind::Latitude) {
                if lat_col < self.min.len() {
                    match self.pole {
                        PoleCap::North => self.max[lat_col] = 90.0,
                        PoleCap::South => self.min[lat_col] = -90.0,
                        PoleCap::None => {}
                    }
                }
            }
        }
    }

    /// Quadrant votes for one longitude column
    pub(crate) fn lon_quadrants(&self, col: usize) -> LonQuadrants {
        let mut quadrants = LonQuadrants::new();
        if let Some(column) = self.columns.get(col) {
            for &lon in column {
                quadrants.add(lon);
            }
        }
        quadrants
    }

    /// Whether the first and last rows coincide in the first two columns
    pub fn is_closed(&self) -> bool {
        if self.n_rows < 2 || self.columns.len() < 2 {
            return true;
        }
        let last = self.n_rows - 1;
        self.columns[..2].iter().all(|c| c[0] == c[last])
    }

    /// Copy structure and metadata, optionally with the data
    pub(crate) fn duplicate(&self, copy_data: bool) -> Self {
        let mut copy = self.clone();
        if !copy_data {
            for column in &mut copy.columns {
                column.iter_mut().for_each(|v| *v = 0.0);
            }
            copy.min.iter_mut().for_each(|v| *v = f64::NAN);
            copy.max.iter_mut().for_each(|v| *v = f64::NAN);
        }
        copy
    }
}
