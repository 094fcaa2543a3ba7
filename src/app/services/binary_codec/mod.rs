//! Typed binary codecs
//!
//! Fixed-width and ASCII element codecs with optional byte swapping, the
//! descriptors that combine them into flat records or gridded arrays, and a
//! chunked byte-swap passthrough.
//!
//! ## Architecture
//!
//! - [`element`] - One element of one type, read or written as `f64`
//! - [`record_format`] - Flat record descriptors such as `3d` or `2f1iw+b`
//! - [`grid_format`] - Row/column-major grid layouts such as `TLf` or `BRdw`
//! - [`passthrough`] - Whole-stream byte swapping in large chunks
//!
//! ## Usage
//!
//! ```rust
//! use geotable::app::services::binary_codec::{BinaryRead, BinaryRecordFormat, Direction};
//!
//! # fn example() -> geotable::Result<()> {
//! let format = BinaryRecordFormat::parse("2d", Direction::Write)?;
//! let mut bytes = Vec::new();
//! format.write_record(&mut bytes, &[1.5, -2.0])?;
//!
//! let format = BinaryRecordFormat::parse("2d", Direction::Read)?;
//! let mut record = Vec::new();
//! let status = format.read_record(&mut bytes.as_slice(), &mut record)?;
//! assert_eq!(status, BinaryRead::Complete);
//! assert_eq!(record, vec![1.5, -2.0]);
//! # Ok(())
//! # }
//! ```

pub mod element;
pub mod grid_format;
pub mod passthrough;
pub mod record_format;

#[cfg(test)]
pub mod tests;

pub use element::{ByteSwap, Direction, ElementCodec, ElementType};
pub use grid_format::GridFormat;
pub use passthrough::{SwapSummary, swap_stream};
pub use record_format::{BinaryRead, BinaryRecordFormat, FormatItem};
