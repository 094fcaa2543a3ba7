//! Value scanning and formatting
//!
//! Converts text tokens to `f64` under an expectation (plain float,
//! dimension, geographic coordinate, absolute or relative time) and formats
//! values back to text through templates that are parsed once per stream.
//!
//! ## Architecture
//!
//! - [`scan`] - Token scanning and expectation auto-detection
//! - [`time`] - Epoch/unit time system, calendar and clock scanning
//! - [`format`] - Float, geographic, date and clock templates
//!
//! ## Usage
//!
//! ```rust
//! use geotable::app::services::value_scan::{Expectation, GeoFormat, FloatTemplate, ValueScanner};
//!
//! # fn example() -> geotable::Result<()> {
//! let scanner = ValueScanner::default();
//! let scanned = scanner.scan("30:15:00W", Expectation::Longitude)?;
//! assert_eq!(scanned.value, -30.25);
//!
//! let geo = GeoFormat::parse("ddd:mm:ssF")?;
//! assert_eq!(geo.format(-30.25, false, &FloatTemplate::default()), "30:15:00W");
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod scan;
pub mod time;

#[cfg(test)]
pub mod tests;

pub use format::{ClockTemplate, DateTemplate, FloatTemplate, GeoFormat, ValueFormatter, format_general};
pub use scan::{Expectation, Scanned, ValueScanner, parse_float, scan_dimension, scan_geo};
pub use time::{TimeSystem, TimeUnit, scan_clock};
