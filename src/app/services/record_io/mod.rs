//! Record reader/writer dispatch
//!
//! Streams records in and out of ASCII text, flat binary records or an
//! in-memory columnar array. The reader is a small state machine that turns
//! its input into table headers, segment breaks and data records; the
//! writer mirrors it on output.
//!
//! ## Architecture
//!
//! - [`source`] - The input variants, chosen once when a stream is opened
//! - [`reader`] - Header, segment and record events plus the record pipeline
//! - [`gap`] - Gap criteria that turn discontinuities into segment breaks
//! - [`segment_header`] - Inline `-G`, `-W`, `-Z`, `-L`, `-D`, `-P` directives
//! - [`writer`] - Output ordering, axis swap and the skip-row rule
//!
//! ## Usage
//!
//! ```rust
//! use std::io::Cursor;
//! use geotable::GeotableConfig;
//! use geotable::app::services::record_io::{RecordEvent, RecordReader};
//!
//! # fn example() -> geotable::Result<()> {
//! let text = "# survey\n> line 1\n1 2\n3 4\n";
//! let config = GeotableConfig::default();
//! let mut reader = RecordReader::from_reader(Cursor::new(text), &config)?;
//!
//! assert_eq!(reader.next_event()?, RecordEvent::TableHeader("# survey".to_string()));
//! assert!(matches!(reader.next_event()?, RecordEvent::SegmentBreak { .. }));
//! assert_eq!(reader.next_event()?, RecordEvent::Data);
//! assert_eq!(reader.record(), &[1.0, 2.0]);
//! # Ok(())
//! # }
//! ```

pub mod gap;
pub mod reader;
pub mod segment_header;
pub mod source;
pub mod writer;

#[cfg(test)]
pub mod tests;

pub use gap::{GapCriterion, GapDetector, GapLogic, GapMetric, GapSign};
pub use reader::{BreakReason, ReadStats, ReaderState, RecordEvent, RecordReader};
pub use segment_header::{SegmentDirectives, StyleSetting};
pub use source::{ColumnarArray, MemoryColumns, RecordSource};
pub use writer::{RecordWriter, SkipRule};
