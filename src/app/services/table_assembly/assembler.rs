//! Table and dataset assembly from record events

use std::path::Path;

use tracing::{debug, info};

use super::polygon::{close_polygon, detect_polar_cap};
use crate::app::models::{ColumnKind, Dataset, LonRange, Segment, Table};
use crate::app::services::record_io::{
    BreakReason, RecordEvent, RecordReader, SegmentDirectives,
};
use crate::config::{AssemblyConfig, GeotableConfig, InputConfig};
use crate::Result;

/// Builds tables from a record reader
#[derive(Debug, Clone)]
pub struct TableAssembler {
    assembly: AssemblyConfig,
    lon_range: LonRange,
    input: InputConfig,
}

/// Segment being filled
struct OpenSegment {
    segment: Segment,
    /// Whether it was opened by a gap, inheriting the previous attributes
    from_gap: bool,
}

impl TableAssembler {
    pub fn new(config: &GeotableConfig) -> Self {
        Self {
            assembly: config.assembly.clone(),
            lon_range: config.geo.lon_range,
            input: config.input.clone(),
        }
    }

    fn open_segment(&self, header: Option<String>, n_columns: Option<usize>) -> Segment {
        let mut segment = Segment::new();
        segment.grow_rows(self.assembly.initial_rows.max(2));
        if let Some(n) = n_columns {
            segment.allocate_columns(n);
        }
        if let Some(text) = header.as_deref() {
            let directives = SegmentDirectives::parse(text);
            segment.label = directives.label;
            segment.distance_hint = directives.distance;
            if let Some(role) = directives.role {
                segment.role = role;
            }
        }
        segment.header = header;
        segment
    }

    /// Append a record, doubling capacity while keeping one spare row for
    /// polygon closure
    fn append(segment: &mut Segment, record: &[f64]) {
        if segment.n_columns() == 0 {
            segment.allocate_columns(record.len());
        }
        if segment.n_rows() + 2 > segment.capacity() {
            let doubled = (segment.capacity() * 2).max(segment.n_rows() + 2);
            segment.grow_rows(doubled);
        }
        segment.push_row(record);
    }

    /// Finish a segment: attach attributes, close polygons, trim and measure
    ///
    /// Returns `None` for a segment without rows.
    fn close_segment(
        &self,
        open: OpenSegment,
        reader: &mut RecordReader,
        kinds: &[ColumnKind],
    ) -> Option<Segment> {
        let OpenSegment {
            mut segment,
            from_gap,
        } = open;
        if let Some(values) = reader.features_mut().take_feature() {
            if reader
                .features()
                .schema()
                .is_some_and(|s| s.geometry.as_ref().is_some_and(|g| g.is_polygon()))
            {
                segment.role = values.role;
            }
            segment.attributes = Some(values);
        } else if !from_gap {
            segment.attributes = None;
        }

        if segment.is_empty() {
            debug!("Dropping empty segment {:?}", segment.header);
            return None;
        }
        if self.assembly.polygon {
            close_polygon(&mut segment);
            let lon_col = kinds.iter().position(|k| *k == ColumnKind::Longitude);
            let lat_col = kinds.iter().position(|k| *k == ColumnKind::Latitude);
            if let (Some(lon), Some(lat)) = (lon_col, lat_col) {
                detect_polar_cap(&mut segment, lon, lat);
            }
        }
        segment.shrink_to_fit();
        segment.compute_min_max(kinds, self.lon_range);
        Some(segment)
    }

    /// Read one table from `reader`
    ///
    /// Returns `None` when the stream held neither a data record nor a
    /// segment header, or when every segment it held was empty.
    pub fn read_table(&self, reader: &mut RecordReader) -> Result<Option<Table>> {
        let mut headers = Vec::new();
        let mut segments: Vec<Segment> = Vec::with_capacity(self.assembly.initial_segments);
        let mut open: Option<OpenSegment> = None;
        let mut seen_content = false;

        loop {
            let event = reader.next_event()?;
            match event {
                RecordEvent::TableHeader(line) => headers.push(line),
                RecordEvent::SegmentBreak { header, reason } => {
                    seen_content = true;
                    let kinds = reader.column_kinds();
                    let mut inherited = None;
                    if let Some(previous) = open.take() {
                        if let Some(closed) = self.close_segment(previous, reader, &kinds) {
                            if reason == BreakReason::Gap {
                                inherited = closed.attributes.clone();
                            }
                            segments.push(closed);
                        }
                    }
                    let mut segment = self.open_segment(header, reader.n_columns());
                    segment.attributes = inherited;
                    open = Some(OpenSegment {
                        segment,
                        from_gap: reason == BreakReason::Gap,
                    });
                }
                RecordEvent::Data | RecordEvent::Mismatch { .. } => {
                    seen_content = true;
                    let open = open.get_or_insert_with(|| OpenSegment {
                        segment: self.open_segment(None, reader.n_columns()),
                        from_gap: false,
                    });
                    Self::append(&mut open.segment, reader.record());
                }
                RecordEvent::EndOfFile => break,
            }
        }

        if !seen_content {
            debug!("{}: no records or segment headers, no table", reader.name());
            return Ok(None);
        }
        let kinds = reader.column_kinds();
        if let Some(last) = open.take() {
            if let Some(closed) = self.close_segment(last, reader, &kinds) {
                segments.push(closed);
            }
        }
        if segments.is_empty() {
            debug!("{}: every segment was empty, no table", reader.name());
            return Ok(None);
        }

        let n_columns = reader
            .n_columns()
            .or_else(|| segments.iter().map(Segment::n_columns).max())
            .unwrap_or(0);
        let mut table = Table::with_capacity(n_columns, segments.len());
        table.header = headers;
        table.schema = reader.features().schema().cloned();
        let uneven = segments.iter().any(|s| s.n_columns() != n_columns);
        for segment in segments {
            table.push_segment(segment);
        }
        if uneven {
            table.set_column_count(n_columns);
        }
        table.link_holes();
        table.compute_min_max(&self.input.column_kinds(n_columns), self.lon_range);
        debug!(
            "{}: table of {} segments, {} records, {} columns",
            reader.name(),
            table.n_segments(),
            table.n_records(),
            n_columns
        );
        Ok(Some(table))
    }

    /// Read one table per reader into a dataset
    ///
    /// Returns `None` when no reader produced a table.
    pub fn read_dataset(
        &self,
        readers: impl IntoIterator<Item = RecordReader>,
    ) -> Result<Option<Dataset>> {
        let mut dataset = Dataset::new(0);
        for mut reader in readers {
            if let Some(table) = self.read_table(&mut reader)? {
                dataset.push_table(table);
            }
        }
        if dataset.n_tables() == 0 {
            return Ok(None);
        }
        let kinds = self.input.column_kinds(dataset.n_columns());
        dataset.compute_min_max(&kinds, self.lon_range);
        Ok(Some(dataset))
    }

    /// Open and read every file as one table of a dataset
    pub fn read_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        config: &GeotableConfig,
    ) -> Result<Option<Dataset>> {
        let mut readers = Vec::with_capacity(paths.len());
        for path in paths {
            readers.push(RecordReader::open(path.as_ref(), config)?);
        }
        let dataset = self.read_dataset(readers)?;
        if let Some(dataset) = &dataset {
            info!(
                "Read {} tables, {} segments, {} records",
                dataset.n_tables(),
                dataset.n_segments(),
                dataset.n_records()
            );
        }
        Ok(dataset)
    }
}
