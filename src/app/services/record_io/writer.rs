//! Record writer
//!
//! Mirrors the reader: segment headers become marker lines (ASCII) or rows
//! of NaN (binary), records pass through the output column order, the
//! lon/lat swap and the skip-row rule before any byte is committed.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::app::models::ColumnKind;
use crate::app::services::binary_codec::{BinaryRecordFormat, ByteSwap, Direction, FormatItem};
use crate::app::services::value_scan::ValueFormatter;
use crate::config::{GeotableConfig, OutputConfig, OutputFormat};
use crate::constants::COMMENT_CHAR;
use crate::{Error, Result};

/// Rows the writer drops based on where NaN values occur
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipRule {
    #[default]
    Never,
    /// Skip rows with a NaN in any column
    AnyNan,
    /// Skip rows where every listed column is NaN
    SubsetNan(Vec<usize>),
    /// Skip rows where not every listed column is NaN
    SubsetNotAllNan(Vec<usize>),
}

impl SkipRule {
    /// Whether `row` is dropped
    pub fn skips(&self, row: &[f64]) -> bool {
        let all_nan = |cols: &[usize]| {
            !cols.is_empty()
                && cols
                    .iter()
                    .all(|&c| row.get(c).is_none_or(|v| v.is_nan()))
        };
        match self {
            SkipRule::Never => false,
            SkipRule::AnyNan => row.iter().any(|v| v.is_nan()),
            SkipRule::SubsetNan(cols) => all_nan(cols),
            SkipRule::SubsetNotAllNan(cols) => !cols.is_empty() && !all_nan(cols),
        }
    }
}

#[derive(Debug)]
enum Encoding {
    Ascii {
        delimiter: String,
        formatter: ValueFormatter,
    },
    Binary(BinaryRecordFormat),
    /// Uniform binary columns whose count is taken from the first record
    BinaryUniform {
        template: BinaryRecordFormat,
        format: Option<BinaryRecordFormat>,
    },
}

/// Writer for one output stream
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    sink: W,
    encoding: Encoding,
    columns: Vec<usize>,
    swap_xy: bool,
    skip: SkipRule,
    segment_headers: bool,
    marker: char,
    kinds: Vec<ColumnKind>,
    n_output: Option<usize>,
    row: Vec<f64>,
    written: u64,
    skipped: u64,
}

/// Whether a binary descriptor is a bare type code such as `d` or `f+b`
fn is_bare_type(spec: &str) -> bool {
    let body = spec.split('+').next().unwrap_or_default();
    body.len() == 1 && body.chars().all(|c| c.is_ascii_alphabetic())
}

impl<W: Write> RecordWriter<W> {
    /// Create a writer; `kinds` are the semantic kinds of the record columns
    pub fn new(
        sink: W,
        output: &OutputConfig,
        formatter: ValueFormatter,
        kinds: Vec<ColumnKind>,
    ) -> Result<Self> {
        let mut n_output = (!output.columns.is_empty()).then_some(output.columns.len());
        let encoding = match &output.format {
            OutputFormat::Ascii => Encoding::Ascii {
                delimiter: output.delimiter.clone(),
                formatter,
            },
            OutputFormat::Binary { spec } if is_bare_type(spec) => Encoding::BinaryUniform {
                template: BinaryRecordFormat::parse(&format!("1{}", spec), Direction::Write)?,
                format: None,
            },
            OutputFormat::Binary { spec } => {
                let format = BinaryRecordFormat::parse(spec, Direction::Write)?;
                match n_output {
                    Some(n) if n != format.n_columns() => {
                        return Err(Error::configuration(format!(
                            "Output selects {} columns but binary format '{}' has {}",
                            n,
                            spec,
                            format.n_columns()
                        )));
                    }
                    _ => n_output = Some(format.n_columns()),
                }
                Encoding::Binary(format)
            }
        };
        Ok(Self {
            sink,
            encoding,
            columns: output.columns.clone(),
            swap_xy: output.swap_xy,
            skip: output.skip.clone(),
            segment_headers: output.segment_headers,
            marker: output.segment_marker,
            kinds,
            n_output,
            row: Vec::new(),
            written: 0,
            skipped: 0,
        })
    }

    /// Create a writer from the output and time sections of `config`
    pub fn from_config(sink: W, config: &GeotableConfig, kinds: Vec<ColumnKind>) -> Result<Self> {
        Self::new(sink, &config.output, config.formatter()?, kinds)
    }

    pub fn is_ascii(&self) -> bool {
        matches!(self.encoding, Encoding::Ascii { .. })
    }

    /// Columns per output row
    pub fn n_output_columns(&self) -> Result<usize> {
        self.n_output.ok_or(Error::OutputColumnsUnset)
    }

    /// Rows written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Rows dropped by the skip rule
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink
            .write_all(bytes)
            .map_err(|e| Error::write_failure("Record output failed", e))
    }

    /// Write a header or comment line; binary output has no header lines
    pub fn write_table_header(&mut self, line: &str) -> Result<()> {
        if !self.is_ascii() {
            return Ok(());
        }
        let text = if line.starts_with(COMMENT_CHAR) {
            format!("{}\n", line)
        } else {
            format!("{} {}\n", COMMENT_CHAR, line)
        };
        self.put(text.as_bytes())
    }

    /// Write a segment header when segment headers are enabled
    pub fn write_segment_header(&mut self, header: Option<&str>) -> Result<()> {
        if !self.segment_headers {
            return Ok(());
        }
        if self.is_ascii() {
            let text = match header {
                Some(h) if !h.is_empty() => format!("{} {}\n", self.marker, h),
                _ => format!("{}\n", self.marker),
            };
            return self.put(text.as_bytes());
        }
        let n = self.n_output_columns()?;
        let nan_row = vec![f64::NAN; n];
        self.encode_binary(&nan_row)
    }

    fn source_index(&self, j: usize, n: usize) -> usize {
        let j = if self.swap_xy && n >= 2 && j < 2 { 1 - j } else { j };
        if self.columns.is_empty() { j } else { self.columns[j] }
    }

    /// Write one record; returns `false` when the skip rule dropped it
    pub fn write_record(&mut self, values: &[f64]) -> Result<bool> {
        let n = *self.n_output.get_or_insert(values.len());
        self.row.clear();
        for j in 0..n {
            let src = self.source_index(j, n);
            self.row.push(values.get(src).copied().unwrap_or(f64::NAN));
        }
        if self.skip.skips(&self.row) {
            self.skipped += 1;
            return Ok(false);
        }

        let row = std::mem::take(&mut self.row);
        let text = match &self.encoding {
            Encoding::Ascii {
                delimiter,
                formatter,
            } => {
                let mut line = String::new();
                for (j, value) in row.iter().enumerate() {
                    if j > 0 {
                        line.push_str(delimiter);
                    }
                    let kind = self.kinds.get(self.source_index(j, n)).copied().unwrap_or_default();
                    line.push_str(&formatter.format_value(*value, kind));
                }
                line.push('\n');
                Some(line)
            }
            Encoding::Binary(_) | Encoding::BinaryUniform { .. } => None,
        };
        let result = match text {
            Some(line) => self.put(line.as_bytes()),
            None => self.encode_binary(&row),
        };
        self.row = row;
        result?;
        self.written += 1;
        Ok(true)
    }

    fn encode_binary(&mut self, row: &[f64]) -> Result<()> {
        let n = row.len();
        let format = match &mut self.encoding {
            Encoding::Binary(format) => &*format,
            Encoding::BinaryUniform { template, format } => {
                let template = &*template;
                &*format.get_or_insert_with(|| match template.items().first() {
                    Some(FormatItem::Column(codec)) => {
                        let swap = if codec.swap { ByteSwap::Both } else { ByteSwap::None };
                        BinaryRecordFormat::uniform(codec.element, n, Direction::Write, swap)
                    }
                    _ => template.clone(),
                })
            }
            Encoding::Ascii { .. } => return Ok(()),
        };
        format.write_record(&mut self.sink, row)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink
            .flush()
            .map_err(|e| Error::write_failure("Flushing record output failed", e))
    }

    /// Flush and return the underlying sink
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }
}
