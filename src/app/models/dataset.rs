//! Dataset: an ordered sequence of tables.

use serde::{Deserialize, Serialize};

use super::segment::Segment;
use super::table::Table;
use super::{ColumnKind, LonRange, update_min_max};

/// How a dataset is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Everything to one stream
    #[default]
    SingleStream,
    /// One file per table
    PerTable,
    /// One file per segment
    PerSegment,
}

/// Who supplied the column storage of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationMode {
    /// Built by the readers or by duplication
    #[default]
    Internal,
    /// Assembled from caller-provided tables
    External,
}

/// Shape of a duplicated dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Same tables and segments as the source
    #[default]
    Replicate,
    /// All segments of all tables in one table
    FlattenVertical,
    /// Tables pasted side by side as extra columns of one table
    FlattenHorizontal,
}

/// Options for [`Dataset::duplicate`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateOptions {
    pub layout: Layout,
    /// Copy values; otherwise the layout is allocated with zeroed data
    pub copy_data: bool,
}

impl DuplicateOptions {
    pub fn with_data(layout: Layout) -> Self {
        Self {
            layout,
            copy_data: true,
        }
    }
}

/// An ordered collection of tables
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: Vec<Table>,
    n_columns: usize,
    min: Vec<f64>,
    max: Vec<f64>,
    pub write_mode: WriteMode,
    pub allocation: AllocationMode,
}

impl Dataset {
    pub fn new(n_columns: usize) -> Self {
        Self {
            n_columns,
            min: vec![f64::NAN; n_columns],
            max: vec![f64::NAN; n_columns],
            ..Default::default()
        }
    }

    /// Wrap caller-built tables
    pub fn from_tables(tables: Vec<Table>) -> Self {
        let n_columns = tables.iter().map(Table::n_columns).max().unwrap_or(0);
        let mut dataset = Self::new(n_columns);
        dataset.tables = tables;
        dataset.allocation = AllocationMode::External;
        dataset
    }

    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    pub fn n_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn n_segments(&self) -> usize {
        self.tables.iter().map(Table::n_segments).sum()
    }

    pub fn n_records(&self) -> usize {
        self.tables.iter().map(Table::n_records).sum()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [Table] {
        &mut self.tables
    }

    /// Append a table, doubling the table capacity when full
    pub fn push_table(&mut self, mut table: Table) {
        if self.tables.len() == self.tables.capacity() {
            let additional = self.tables.capacity().max(1);
            self.tables.reserve_exact(additional);
        }
        table.id = self.tables.len();
        self.n_columns = self.n_columns.max(table.n_columns());
        self.tables.push(table);
    }

    /// Change the column count of every table
    pub fn set_column_count(&mut self, n_columns: usize) {
        for table in &mut self.tables {
            table.set_column_count(n_columns);
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

    /// Recompute extents of every segment, table and the dataset
    pub fn compute_min_max(&mut self, kinds: &[ColumnKind], default_range: LonRange) {
        self.min = vec![f64::NAN; self.n_columns];
        self.max = vec![f64::NAN; self.n_columns];
        for table in &mut self.tables {
            table.compute_min_max(kinds, default_range);
            for col in 0..self.n_columns.min(table.n_columns()) {
                update_min_max(&mut self.min[col], &mut self.max[col], table.min()[col]);
                update_min_max(&mut self.min[col], &mut self.max[col], table.max()[col]);
            }
        }
    }

    /// Duplicate the dataset with the requested layout
    ///
    /// Vertical flattening concatenates all segments of all tables into one
    /// table. Horizontal flattening pastes each table's columns beside the
    /// first table's; the first table's segment and row layout governs the
    /// shape, shorter tables leave zeros and longer ones are cut.
    pub fn duplicate(&self, options: DuplicateOptions) -> Dataset {
        let mut copy = match options.layout {
            Layout::Replicate => {
                let mut copy = Dataset::new(self.n_columns);
                copy.tables = self
                    .tables
                    .iter()
                    .map(|t| t.duplicate(options.copy_data))
                    .collect();
                copy
            }
            Layout::FlattenVertical => {
                let mut table = Table::new(self.n_columns);
                if let Some(first) = self.tables.first() {
                    table.header = first.header.clone();
                    table.schema = first.schema.clone();
                }
                for source in &self.tables {
                    for segment in source.duplicate(options.copy_data).into_segments() {
                        table.push_segment(segment);
                    }
                }
                let mut copy = Dataset::new(self.n_columns);
                copy.push_table(table);
                copy
            }
            Layout::FlattenHorizontal => self.flatten_horizontal(options.copy_data),
        };
        copy.write_mode = self.write_mode;
        copy.allocation = AllocationMode::Internal;
        if options.copy_data {
            copy.min = self.min.clone();
            copy.max = self.max.clone();
            copy.min.resize(copy.n_columns, f64::NAN);
            copy.max.resize(copy.n_columns, f64::NAN);
        }
        copy
    }

    fn flatten_horizontal(&self, copy_data: bool) -> Dataset {
        let total_columns: usize = self.tables.iter().map(Table::n_columns).sum();
        let Some(first) = self.tables.first() else {
            return Dataset::new(0);
        };

        let mut table = Table::new(total_columns);
        table.header = first.header.clone();
        for (s, template) in first.segments().iter().enumerate() {
            let n_rows = template.n_rows();
            let mut segment = Segment::with_shape(total_columns, n_rows);
            segment.header = template.header.clone();
            segment.label = template.label.clone();
            segment.role = template.role;

            if copy_data {
                let mut offset = 0;
                for source in &self.tables {
                    if let Some(src) = source.segment(s) {
                        for col in 0..source.n_columns() {
                            let Some(values) = src.column(col) else {
                                continue;
                            };
                            for (row, &value) in values.iter().take(n_rows).enumerate() {
                                segment.set_value(row, offset + col, value);
                            }
                        }
                    }
                    offset += source.n_columns();
                }
            }
            table.push_segment(segment);
        }

        let mut copy = Dataset::new(total_columns);
        copy.push_table(table);
        copy
    }
}
