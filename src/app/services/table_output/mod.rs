//! Dataset output
//!
//! Writes assembled datasets back out through the record writer. A dataset
//! goes to a single stream, to one file per table, or to one file per
//! segment; per-table and per-segment files are named from a template or
//! from the output file carried by the table or segment itself.
//!
//! ## Architecture
//!
//! - [`naming`] - File name templates and override resolution
//! - [`writer`] - The [`DatasetWriter`] and its write statistics
//!
//! ## Usage
//!
//! ```rust
//! use geotable::GeotableConfig;
//! use geotable::app::models::WriteMode;
//! use geotable::app::services::table_assembly::TableAssembler;
//! use geotable::app::services::table_output::write_dataset;
//!
//! # fn example() -> geotable::Result<()> {
//! let config = GeotableConfig::default()
//!     .with_write_mode(WriteMode::PerSegment, Some("out/track_{table}_{segment}.txt".into()));
//! if let Some(dataset) = TableAssembler::new(&config).read_files(&["tracks.txt"], &config)? {
//!     let stats = write_dataset(&dataset, &config)?;
//!     println!("{}", stats);
//! }
//! # Ok(())
//! # }
//! ```

pub mod naming;
pub mod writer;

#[cfg(test)]
pub mod tests;

pub use naming::{render_template, segment_path, table_path};
pub use writer::{DatasetWriter, WriteStats, write_dataset};
