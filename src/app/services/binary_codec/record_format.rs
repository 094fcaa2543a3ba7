//! Binary record format descriptors
//!
//! A descriptor such as `3d`, `2d1f`, `d,f,i`, `2dw1i` or `3f+b` lists the
//! element type of every column of a flat binary record. A count may precede
//! each type code, `w` after a group byte-swaps that group, `Nx` skips `N`
//! bytes, and a trailing `+b`/`+l` declares the file big- or little-endian.

use std::io::{BufRead, Write};

use tracing::debug;

use super::element::{ByteSwap, Direction, ElementCodec, ElementType, read_full};
use crate::constants::MAX_COLUMNS;
use crate::{Error, Result};

/// One item of a record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatItem {
    /// A data column decoded by the given codec
    Column(ElementCodec),
    /// Bytes to skip on input (zero-filled on output)
    Skip(usize),
}

/// Outcome of reading one binary record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryRead {
    /// All columns were filled
    Complete,
    /// The stream ended before the first byte of the record
    End,
    /// The stream ended inside the record after this many columns
    Partial(usize),
}

/// Layout of one flat binary record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRecordFormat {
    items: Vec<FormatItem>,
    n_columns: usize,
    descriptor: String,
}

impl BinaryRecordFormat {
    /// `n_columns` columns of one element type
    pub fn uniform(element: ElementType, n_columns: usize, direction: Direction, swap: ByteSwap) -> Self {
        let codec = ElementCodec::new(element, direction, swap);
        Self {
            items: vec![FormatItem::Column(codec); n_columns],
            n_columns,
            descriptor: format!("{}{}", n_columns, element.code()),
        }
    }

    /// Parse a descriptor for use in `direction`
    pub fn parse(descriptor: &str, direction: Direction) -> Result<Self> {
        let (body, endian) = match descriptor.find('+') {
            Some(pos) => (&descriptor[..pos], Some(&descriptor[pos + 1..])),
            None => (descriptor, None),
        };
        let host_swap = match endian {
            None => false,
            Some("b") | Some("B") => cfg!(target_endian = "little"),
            Some("l") | Some("L") => cfg!(target_endian = "big"),
            Some(other) => {
                return Err(Error::invalid_format(
                    descriptor,
                    format!("unknown endianness modifier '+{}'", other),
                ));
            }
        };

        let mut items = Vec::new();
        let mut n_columns = 0usize;
        let mut count = String::new();
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '0'..='9' => count.push(c),
                ',' | ' ' => {}
                _ => {
                    let n: usize = if count.is_empty() {
                        1
                    } else {
                        count.parse().map_err(|_| {
                            Error::invalid_format(descriptor, format!("bad count '{}'", count))
                        })?
                    };
                    count.clear();
                    if c == 'x' {
                        items.push(FormatItem::Skip(n));
                        continue;
                    }
                    let element = ElementType::from_code(c)?;
                    if n > MAX_COLUMNS - n_columns {
                        return Err(Error::ColumnLimitExceeded {
                            requested: n_columns.saturating_add(n),
                            limit: MAX_COLUMNS,
                        });
                    }
                    n_columns += n;
                    let group_swap = if chars.peek() == Some(&'w') {
                        chars.next();
                        true
                    } else {
                        false
                    };
                    let swap = if group_swap ^ host_swap {
                        ByteSwap::Both
                    } else {
                        ByteSwap::None
                    };
                    let codec = ElementCodec::new(element, direction, swap);
                    items.extend(std::iter::repeat_n(FormatItem::Column(codec), n));
                }
            }
        }
        if !count.is_empty() {
            return Err(Error::invalid_format(descriptor, "count without a type code"));
        }

        if n_columns == 0 {
            return Err(Error::invalid_format(descriptor, "no columns declared"));
        }
        debug!("Binary record format '{}': {} columns", descriptor, n_columns);
        Ok(Self {
            items,
            n_columns,
            descriptor: descriptor.to_string(),
        })
    }

    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn items(&self) -> &[FormatItem] {
        &self.items
    }

    /// Whether any column is ASCII encoded
    pub fn has_ascii(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i, FormatItem::Column(c) if c.element.is_ascii()))
    }

    /// Record width in bytes, `None` when ASCII columns are present
    pub fn record_width(&self) -> Option<usize> {
        self.items.iter().try_fold(0, |acc, item| match item {
            FormatItem::Column(c) => c.element.width().map(|w| acc + w),
            FormatItem::Skip(n) => Some(acc + n),
        })
    }

    fn check_limit(&self) -> Result<()> {
        if self.n_columns > MAX_COLUMNS {
            return Err(Error::ColumnLimitExceeded {
                requested: self.n_columns,
                limit: MAX_COLUMNS,
            });
        }
        Ok(())
    }

    /// Read one record into `out`, which is resized to the column count
    pub fn read_record(&self, reader: &mut dyn BufRead, out: &mut Vec<f64>) -> Result<BinaryRead> {
        self.check_limit()?;
        out.clear();
        out.resize(self.n_columns, f64::NAN);
        let mut col = 0;
        let mut started = false;
        for item in &self.items {
            match item {
                FormatItem::Skip(n) => {
                    let mut sink = vec![0u8; *n];
                    let got = read_full(reader, &mut sink)?;
                    if got < *n {
                        return Ok(if !started && got == 0 {
                            BinaryRead::End
                        } else {
                            BinaryRead::Partial(col)
                        });
                    }
                    started = true;
                }
                FormatItem::Column(codec) => match codec.read(reader) {
                    Ok(Some(value)) => {
                        out[col] = value;
                        col += 1;
                        started = true;
                    }
                    Ok(None) if !started => return Ok(BinaryRead::End),
                    Ok(None) | Err(Error::ShortRead { .. }) => {
                        return Ok(BinaryRead::Partial(col));
                    }
                    Err(e) => return Err(e),
                },
            }
        }
        Ok(BinaryRead::Complete)
    }

    /// Write one record; missing trailing values are written as NaN
    pub fn write_record(&self, writer: &mut dyn Write, values: &[f64]) -> Result<()> {
        self.check_limit()?;
        let mut col = 0;
        for item in &self.items {
            match item {
                FormatItem::Skip(n) => writer
                    .write_all(&vec![0u8; *n])
                    .map_err(|e| Error::write_failure("Binary padding write failed", e))?,
                FormatItem::Column(codec) => {
                    codec.write(writer, values.get(col).copied().unwrap_or(f64::NAN))?;
                    col += 1;
                }
            }
        }
        if self.has_ascii() {
            writer
                .write_all(b"\n")
                .map_err(|e| Error::write_failure("ASCII record terminator write failed", e))?;
        }
        Ok(())
    }
}
