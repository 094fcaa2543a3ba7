//! Application constants for geotable
//!
//! This module contains protocol literals, default values and limits used
//! throughout the record I/O core.

// =============================================================================
// ASCII Record Syntax
// =============================================================================

/// Default character introducing a segment header line
pub const DEFAULT_SEGMENT_MARKER: char = '>';

/// Character introducing a table header / comment line
pub const COMMENT_CHAR: char = '#';

/// Literal used for missing values on output
pub const NAN_TEXT: &str = "NaN";

/// Default field separator for ASCII output
pub const DEFAULT_FIELD_DELIMITER: &str = "\t";

/// Default floating point output template
pub const DEFAULT_FLOAT_FORMAT: &str = "%.12g";

// =============================================================================
// Feature-Attribute Protocol
// =============================================================================

/// Sigil character introducing a feature-attribute tag
pub const FEATURE_SIGIL: char = '@';

/// Version tag that must open a feature-attribute header
pub const FEATURE_VERSION_TAG: &str = "VGMT1.0";

/// Literal comment line switching from header to data phase
pub const FEATURE_DATA_MARKER: &str = "FEATURE_DATA";

/// Delimiter between field names, types and values
pub const FEATURE_FIELD_DELIMITER: char = '|';

// =============================================================================
// Binary Records
// =============================================================================

/// Hard per-record column limit for binary input and output
pub const MAX_COLUMNS: usize = 4096;

/// Chunk size for byteswap passthrough (bytes)
pub const BYTESWAP_CHUNK_SIZE: usize = 1024 * 1024;

// =============================================================================
// Container Growth
// =============================================================================

/// Initial number of rows reserved for a segment during streaming read
pub const INITIAL_ROW_CAPACITY: usize = 2048;

/// Initial number of segments reserved for a table during streaming read
pub const INITIAL_SEGMENT_CAPACITY: usize = 64;

// =============================================================================
// Time
// =============================================================================

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Upper bound (exclusive) of a clock reading, allowing one leap second
pub const MAX_CLOCK_SECONDS: f64 = 86_401.0;

/// Most `x` decimals a geographic or clock template may request
pub const MAX_TEMPLATE_DECIMALS: usize = 9;

/// Default time epoch for relative time values
pub const DEFAULT_TIME_EPOCH: &str = "1970-01-01T00:00:00";

/// Years with two digits at or above this value map to 19xx, below to 20xx
pub const DEFAULT_Y2K_OFFSET_YEAR: i32 = 1950;

// =============================================================================
// Geodesy
// =============================================================================

/// Mean Earth radius in kilometres used for great-circle gap distances
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Tolerance when deciding that accumulated longitude change is a full turn
pub const POLAR_CAP_TOLERANCE_DEG: f64 = 1.0e-4;
