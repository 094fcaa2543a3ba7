//! Input sources behind the record reader
//!
//! The source variant is chosen once when a stream is opened; the reader
//! dispatches on it per record.

use std::fmt;
use std::io::BufRead;

use crate::app::services::binary_codec::BinaryRecordFormat;

/// External array of equally indexed variables
///
/// Record `i` of a columnar stream holds value `i` of every variable.
pub trait ColumnarArray {
    /// Number of variables, i.e. columns per record
    fn n_variables(&self) -> usize;

    /// Number of records available
    fn n_records(&self) -> usize;

    /// Value of `variable` at `record`, NaN when that variable is shorter
    fn value(&self, variable: usize, record: usize) -> f64;
}

/// In-memory [`ColumnarArray`] holding one vector per variable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryColumns {
    columns: Vec<Vec<f64>>,
}

impl MemoryColumns {
    pub fn new(columns: Vec<Vec<f64>>) -> Self {
        Self { columns }
    }
}

impl ColumnarArray for MemoryColumns {
    fn n_variables(&self) -> usize {
        self.columns.len()
    }

    fn n_records(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn value(&self, variable: usize, record: usize) -> f64 {
        self.columns
            .get(variable)
            .and_then(|column| column.get(record))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Where records come from
pub enum RecordSource {
    /// Text lines of whitespace or comma separated tokens
    Ascii(Box<dyn BufRead>),
    /// Fixed-layout binary records
    Binary {
        reader: Box<dyn BufRead>,
        format: BinaryRecordFormat,
    },
    /// Variables of an external array, one record per index
    Columnar {
        array: Box<dyn ColumnarArray>,
        next: usize,
    },
}

impl RecordSource {
    pub fn ascii(reader: impl BufRead + 'static) -> Self {
        RecordSource::Ascii(Box::new(reader))
    }

    pub fn binary(reader: impl BufRead + 'static, format: BinaryRecordFormat) -> Self {
        RecordSource::Binary {
            reader: Box::new(reader),
            format,
        }
    }

    pub fn columnar(array: impl ColumnarArray + 'static) -> Self {
        RecordSource::Columnar {
            array: Box::new(array),
            next: 0,
        }
    }

    /// Column count fixed by the source layout, if any
    pub fn declared_columns(&self) -> Option<usize> {
        match self {
            RecordSource::Ascii(_) => None,
            RecordSource::Binary { format, .. } => Some(format.n_columns()),
            RecordSource::Columnar { array, .. } => Some(array.n_variables()),
        }
    }

    pub fn is_ascii(&self) -> bool {
        matches!(self, RecordSource::Ascii(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RecordSource::Ascii(_) => "ascii",
            RecordSource::Binary { .. } => "binary",
            RecordSource::Columnar { .. } => "columnar",
        }
    }
}

impl fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::Ascii(_) => f.write_str("RecordSource::Ascii"),
            RecordSource::Binary { format, .. } => {
                write!(f, "RecordSource::Binary({})", format.descriptor())
            }
            RecordSource::Columnar { array, next } => write!(
                f,
                "RecordSource::Columnar({} variables, record {})",
                array.n_variables(),
                next
            ),
        }
    }
}
