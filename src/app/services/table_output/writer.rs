//! Dataset writer
//!
//! Walks a [`Dataset`] and sends its headers, feature attributes and rows
//! through a [`RecordWriter`], either into one stream or into one file per
//! table or per segment.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::naming::{check_template, segment_path, table_path};
use crate::app::models::{ColumnKind, Dataset, Segment, Table, WriteMode};
use crate::app::services::feature_attributes::{feature_lines, header_lines};
use crate::app::services::record_io::RecordWriter;
use crate::app::services::value_scan::ValueFormatter;
use crate::config::GeotableConfig;
use crate::constants::{COMMENT_CHAR, FEATURE_DATA_MARKER, FEATURE_SIGIL};
use crate::{Error, Result};

/// Counts gathered while writing a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub files: usize,
    pub tables: usize,
    pub segments: usize,
    pub records: u64,
    /// Rows dropped by the skip rule
    pub skipped: u64,
}

impl WriteStats {
    fn absorb<W: Write>(&mut self, writer: &RecordWriter<W>) {
        self.records += writer.written();
        self.skipped += writer.skipped();
    }
}

impl fmt::Display for WriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records in {} segments of {} tables",
            self.records, self.segments, self.tables
        )?;
        if self.files > 0 {
            write!(f, ", {} files", self.files)?;
        }
        if self.skipped > 0 {
            write!(f, ", {} rows skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// Header lines that belong to the feature-attribute protocol
///
/// These are regenerated from the table schema rather than copied.
fn is_protocol_line(line: &str) -> bool {
    let body = line
        .trim_start()
        .strip_prefix(COMMENT_CHAR)
        .unwrap_or(line)
        .trim();
    body.starts_with(FEATURE_SIGIL) || body == FEATURE_DATA_MARKER
}

/// Writes datasets according to the output section of a configuration
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    config: GeotableConfig,
    formatter: ValueFormatter,
}

impl DatasetWriter {
    pub fn new(config: &GeotableConfig) -> Result<Self> {
        Ok(Self {
            formatter: config.formatter()?,
            config: config.clone(),
        })
    }

    pub fn write_mode(&self) -> WriteMode {
        self.config.output.write_mode
    }

    fn kinds(&self, dataset: &Dataset) -> Vec<ColumnKind> {
        self.config.input.column_kinds(dataset.n_columns())
    }

    fn record_writer<W: Write>(&self, sink: W, kinds: &[ColumnKind]) -> Result<RecordWriter<W>> {
        RecordWriter::new(
            sink,
            &self.config.output,
            self.formatter.clone(),
            kinds.to_vec(),
        )
    }

    fn write_table_headers<W: Write>(writer: &mut RecordWriter<W>, table: &Table) -> Result<()> {
        let skip_protocol = table.schema.is_some();
        for line in &table.header {
            if skip_protocol && is_protocol_line(line) {
                continue;
            }
            writer.write_table_header(line)?;
        }
        if let Some(schema) = &table.schema {
            for line in header_lines(schema) {
                writer.write_table_header(&line)?;
            }
        }
        Ok(())
    }

    fn write_segment<W: Write>(
        writer: &mut RecordWriter<W>,
        table: &Table,
        segment: &Segment,
    ) -> Result<()> {
        writer.write_segment_header(segment.header.as_deref())?;
        if let Some(schema) = &table.schema {
            let mut values = segment.attributes.clone().unwrap_or_default();
            values.role = segment.role;
            for line in feature_lines(schema, &values) {
                writer.write_table_header(&line)?;
            }
        }
        let mut row = Vec::with_capacity(segment.n_columns());
        for i in 0..segment.n_rows() {
            row.clear();
            for col in 0..segment.n_columns() {
                row.push(segment.value(i, col).unwrap_or(f64::NAN));
            }
            writer.write_record(&row)?;
        }
        Ok(())
    }

    /// Write the whole dataset to one stream
    ///
    /// Only the first table's header lines are written; the rest would be
    /// read back as stray comments in the middle of the data.
    pub fn write_stream<W: Write>(&self, dataset: &Dataset, sink: W) -> Result<WriteStats> {
        let kinds = self.kinds(dataset);
        let mut writer = self.record_writer(sink, &kinds)?;
        let mut stats = WriteStats::default();
        for (t, table) in dataset.tables().iter().enumerate() {
            if t == 0 {
                Self::write_table_headers(&mut writer, table)?;
            }
            for segment in table.segments() {
                Self::write_segment(&mut writer, table, segment)?;
                stats.segments += 1;
            }
            stats.tables += 1;
        }
        writer.flush()?;
        stats.absorb(&writer);
        debug!("Wrote dataset to stream: {}", stats);
        Ok(stats)
    }

    fn create(path: &Path) -> Result<BufWriter<File>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::cannot_open(parent.display().to_string(), e))?;
        }
        let file =
            File::create(path).map_err(|e| Error::cannot_open(path.display().to_string(), e))?;
        Ok(BufWriter::new(file))
    }

    fn claim(used: &mut HashSet<PathBuf>, path: PathBuf) -> Result<PathBuf> {
        if !used.insert(path.clone()) {
            return Err(Error::configuration(format!(
                "Output file '{}' would be written more than once",
                path.display()
            )));
        }
        Ok(path)
    }

    fn needs_template(&self, dataset: &Dataset) -> bool {
        match self.write_mode() {
            WriteMode::SingleStream => true,
            WriteMode::PerTable => dataset.tables().iter().any(|t| t.output_file.is_none()),
            WriteMode::PerSegment => dataset
                .tables()
                .iter()
                .flat_map(Table::segments)
                .any(|s| s.output_file.is_none()),
        }
    }

    /// Write the dataset to files following the configured write mode
    ///
    /// Single-stream mode writes one file named by the template; the other
    /// modes name each file from its table or segment override, falling back
    /// to the template with `{table}` and `{segment}` substituted.
    pub fn write_files(&self, dataset: &Dataset) -> Result<WriteStats> {
        let template = self.config.output.file_template.as_deref();
        let mode = self.write_mode();
        if self.needs_template(dataset) {
            if let Some(template) = template {
                check_template(mode, template)?;
            }
        }

        let kinds = self.kinds(dataset);
        let mut used = HashSet::new();
        let mut stats = WriteStats::default();
        match mode {
            WriteMode::SingleStream => {
                let path = template.map(PathBuf::from).ok_or_else(|| {
                    Error::configuration("Writing to a file needs a file template")
                })?;
                let mut totals = self.write_stream(dataset, Self::create(&path)?)?;
                totals.files = 1;
                info!("Wrote {}: {}", path.display(), totals);
                return Ok(totals);
            }
            WriteMode::PerTable => {
                for table in dataset.tables() {
                    let path = Self::claim(&mut used, table_path(table, template)?)?;
                    let mut writer = self.record_writer(Self::create(&path)?, &kinds)?;
                    Self::write_table_headers(&mut writer, table)?;
                    for segment in table.segments() {
                        Self::write_segment(&mut writer, table, segment)?;
                        stats.segments += 1;
                    }
                    writer.flush()?;
                    stats.absorb(&writer);
                    stats.tables += 1;
                    stats.files += 1;
                    debug!("Wrote table {} to {}", table.id, path.display());
                }
            }
            WriteMode::PerSegment => {
                for table in dataset.tables() {
                    for (index, segment) in table.segments().iter().enumerate() {
                        let path =
                            Self::claim(&mut used, segment_path(table, index, segment, template)?)?;
                        let mut writer = self.record_writer(Self::create(&path)?, &kinds)?;
                        Self::write_table_headers(&mut writer, table)?;
                        Self::write_segment(&mut writer, table, segment)?;
                        writer.flush()?;
                        stats.absorb(&writer);
                        stats.segments += 1;
                        stats.files += 1;
                    }
                    stats.tables += 1;
                }
            }
        }
        info!("Wrote {:?} output: {}", mode, stats);
        Ok(stats)
    }
}

/// Write `dataset` to files as configured
pub fn write_dataset(dataset: &Dataset, config: &GeotableConfig) -> Result<WriteStats> {
    DatasetWriter::new(config)?.write_files(dataset)
}
