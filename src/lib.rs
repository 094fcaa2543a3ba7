//! Geotable Library
//!
//! A Rust library for reading and writing geospatial data tables made of
//! multi-segment records.
//!
//! This library provides tools for:
//! - Typed binary record codecs with optional byte swapping
//! - ASCII, binary and columnar record readers behind one dispatch
//! - Segment/Table/Dataset containers with growth, duplication and extents
//! - Geographic (DMS) and calendar/clock aware value scanning and formatting
//! - The `@`-tagged feature-attribute protocol carried in comment lines
//! - Dataset output as one stream, per-table files or per-segment files

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod binary_codec;
        pub mod feature_attributes;
        pub mod record_io;
        pub mod table_assembly;
        pub mod table_output;
        pub mod value_scan;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{ColumnKind, Dataset, Segment, Table};
pub use config::GeotableConfig;

/// Result type alias for geotable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for table I/O operations
///
/// End of input is not an error: codec reads report it as `Ok(None)` and the
/// record reader as [`app::services::record_io::RecordEvent::EndOfFile`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be opened for reading or writing
    #[error("Cannot open '{path}': {source}")]
    CannotOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Bytes could not be committed to the output stream
    #[error("Write failure: {message}")]
    WriteFailure {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A fixed-width element was cut short by the end of the stream
    #[error("Short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// Unknown binary element type code
    #[error("Unsupported column type code '{code}'")]
    UnsupportedTypeCode { code: char },

    /// Binary record wider than the per-record column limit
    #[error("Binary record of {requested} columns exceeds the limit of {limit}")]
    ColumnLimitExceeded { requested: usize, limit: usize },

    /// Output needs a column count but none was established
    #[error("Output column count is not set")]
    OutputColumnsUnset,

    /// A format descriptor string could not be parsed
    #[error("Invalid format '{descriptor}': {message}")]
    InvalidFormat { descriptor: String, message: String },

    /// A text token could not be converted to a value
    #[error("Cannot scan '{token}': {reason}")]
    Scan { token: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be decoded
    #[error("Configuration file '{path}': {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an open failure for a path
    pub fn cannot_open(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::CannotOpen {
            path: path.into(),
            source,
        }
    }

    /// Create a write failure with context
    pub fn write_failure(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            message: message.into(),
            source,
        }
    }

    /// Create an invalid format error
    pub fn invalid_format(descriptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            descriptor: descriptor.into(),
            message: message.into(),
        }
    }

    /// Create a scan error
    pub fn scan(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Scan {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error reflects a configuration problem the caller must fix
    ///
    /// These abort processing; data-quality problems never reach `Err`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CannotOpen { .. }
                | Self::UnsupportedTypeCode { .. }
                | Self::ColumnLimitExceeded { .. }
                | Self::OutputColumnsUnset
                | Self::InvalidFormat { .. }
                | Self::Configuration { .. }
                | Self::ConfigFile { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::ConfigFile {
            path: "unknown".to_string(),
            source: error,
        }
    }
}
