//! Table and dataset read-assembly
//!
//! Pulls events from a [`RecordReader`](crate::app::services::record_io::RecordReader)
//! and builds segments, tables and datasets from them. Segments are closed
//! at every break: trimmed, measured, dropped when empty, and given the
//! feature attributes gathered for them.
//!
//! ## Architecture
//!
//! - [`assembler`] - The event loop building tables and datasets
//! - [`polygon`] - Automatic polygon closure and polar-cap detection
//!
//! ## Usage
//!
//! ```rust
//! use std::io::Cursor;
//! use geotable::GeotableConfig;
//! use geotable::app::services::record_io::RecordReader;
//! use geotable::app::services::table_assembly::TableAssembler;
//!
//! # fn example() -> geotable::Result<()> {
//! let config = GeotableConfig::default().with_polygon_mode();
//! let mut reader = RecordReader::from_reader(Cursor::new("> a\n1 1\n2 1\n2 2\n"), &config)?;
//! let table = TableAssembler::new(&config).read_table(&mut reader)?.unwrap();
//! assert_eq!(table.segment(0).unwrap().n_rows(), 4);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod polygon;

#[cfg(test)]
pub mod tests;

pub use assembler::TableAssembler;
pub use polygon::{accumulated_longitude, close_polygon, detect_polar_cap};
