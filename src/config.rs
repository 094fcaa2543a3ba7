//! Configuration management and validation.
//!
//! Provides the configuration structures for reading, writing and
//! assembling tables: input layout and record policies, output layout and
//! value templates, the time system, longitude framing and container sizing.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::models::{ColumnKind, LonRange, WriteMode};
use crate::app::services::binary_codec::{BinaryRecordFormat, Direction};
use crate::app::services::record_io::{GapCriterion, GapLogic, SkipRule};
use crate::app::services::value_scan::{TimeSystem, TimeUnit, ValueFormatter, ValueScanner};
use crate::constants::{
    DEFAULT_FIELD_DELIMITER, DEFAULT_FLOAT_FORMAT, DEFAULT_SEGMENT_MARKER, DEFAULT_TIME_EPOCH,
    DEFAULT_Y2K_OFFSET_YEAR, INITIAL_ROW_CAPACITY, INITIAL_SEGMENT_CAPACITY, MAX_COLUMNS,
};
use crate::{Error, Result};

/// Layout of an input stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    #[default]
    Ascii,
    /// Binary records described by a format string such as `3d` or `2f1iw+b`
    Binary { spec: String },
    /// Variables of an in-memory array
    Columnar,
}

/// Column count the caller asks the reader for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnCount {
    /// Take the count from the first data record
    #[default]
    Unknown,
    /// Flag records that differ from this count
    Fixed(usize),
    /// Accept whatever each record or format carries
    Any,
}

/// What happens to records with NaN coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// Pass NaN values through
    #[default]
    Keep,
    /// Drop records whose first or second column is NaN
    SkipXy,
    /// Drop records with a NaN in any column
    SkipAny,
}

fn one() -> f64 {
    1.0
}

/// One input column selection, `<col>[+l][+s<scale>][+o<offset>]`
///
/// The selected value is transformed as `log10` first, then scaled, then
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub source: usize,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub log10: bool,
    /// Semantic kind of the selected column, overriding `input.kinds`
    #[serde(default)]
    pub kind: Option<ColumnKind>,
}

impl ColumnSelection {
    pub fn new(source: usize) -> Self {
        Self {
            source,
            scale: 1.0,
            offset: 0.0,
            log10: false,
            kind: None,
        }
    }

    /// Apply the transform to a selected value
    pub fn apply(&self, value: f64) -> f64 {
        let value = if self.log10 { value.log10() } else { value };
        value * self.scale + self.offset
    }
}

impl FromStr for ColumnSelection {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let bad = |message: &str| Error::invalid_format(text, message);
        let mut parts = text.split('+');
        let source = parts
            .next()
            .unwrap_or_default()
            .parse::<usize>()
            .map_err(|_| bad("column selection must start with a column number"))?;
        let mut selection = ColumnSelection::new(source);
        for modifier in parts {
            let mut chars = modifier.chars();
            let key = chars.next();
            let value = chars.as_str();
            match key {
                Some('l') if value.is_empty() => selection.log10 = true,
                Some('s') => selection.scale = value.parse().map_err(|_| bad("bad scale"))?,
                Some('o') => selection.offset = value.parse().map_err(|_| bad("bad offset"))?,
                _ => return Err(bad("modifiers are +l, +s<scale> and +o<offset>")),
            }
        }
        Ok(selection)
    }
}

/// Data column fed from a named feature attribute, `<col>=<name>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspatialMapping {
    pub column: usize,
    pub name: String,
}

impl FromStr for AspatialMapping {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (column, name) = text
            .split_once('=')
            .ok_or_else(|| Error::invalid_format(text, "expected <column>=<name>"))?;
        let column = column
            .trim()
            .parse()
            .map_err(|_| Error::invalid_format(text, "column must be a number"))?;
        if name.trim().is_empty() {
            return Err(Error::invalid_format(text, "attribute name is empty"));
        }
        Ok(AspatialMapping {
            column,
            name: name.trim().to_string(),
        })
    }
}

/// Input stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub format: InputFormat,
    pub columns: ColumnCount,

    /// Lines treated as table header regardless of their content
    pub header_lines: usize,

    pub segment_marker: char,

    /// A blank line ends the current segment
    pub blank_line_breaks: bool,

    /// An all-NaN record ends the current segment
    pub nan_record_breaks: bool,

    /// Input column selection and transforms; empty keeps columns as read
    pub select: Vec<ColumnSelection>,

    /// Input holds latitude before longitude
    pub swap_xy: bool,

    /// Move longitude columns into the configured framing while reading
    pub normalize_longitudes: bool,

    pub nan_policy: NanPolicy,

    /// Drop records repeating the previous record's first two columns
    pub skip_duplicates: bool,

    pub gaps: Vec<GapCriterion>,
    pub gap_logic: GapLogic,

    pub aspatial: Vec<AspatialMapping>,

    /// Semantic kind of each column after selection
    pub kinds: Vec<ColumnKind>,

    /// Drop feature values whose count differs from the schema
    pub strict_attributes: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            format: InputFormat::Ascii,
            columns: ColumnCount::Unknown,
            header_lines: 0,
            segment_marker: DEFAULT_SEGMENT_MARKER,
            blank_line_breaks: false,
            nan_record_breaks: false,
            select: Vec::new(),
            swap_xy: false,
            normalize_longitudes: false,
            nan_policy: NanPolicy::Keep,
            skip_duplicates: false,
            gaps: Vec::new(),
            gap_logic: GapLogic::Any,
            aspatial: Vec::new(),
            kinds: Vec::new(),
            strict_attributes: false,
        }
    }
}

impl InputConfig {
    /// Semantic kind of every column after selection, padded with `Float`
    /// up to `n_columns`
    pub fn column_kinds(&self, n_columns: usize) -> Vec<ColumnKind> {
        let mut kinds: Vec<ColumnKind> = if self.select.is_empty() {
            self.kinds.clone()
        } else {
            self.select
                .iter()
                .enumerate()
                .map(|(i, s)| s.kind.or_else(|| self.kinds.get(i).copied()).unwrap_or_default())
                .collect()
        };
        if kinds.len() < n_columns {
            kinds.resize(n_columns, ColumnKind::Float);
        }
        kinds
    }
}

/// Layout of an output stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Ascii,
    /// Binary records; a bare type code such as `d` takes the column count
    /// from the data
    Binary { spec: String },
}

/// Output stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Write segment headers (text lines, or NaN rows in binary)
    pub segment_headers: bool,

    pub segment_marker: char,
    pub delimiter: String,

    /// Output column order; empty writes every column in order
    pub columns: Vec<usize>,

    /// Write latitude before longitude
    pub swap_xy: bool,

    pub skip: SkipRule,

    pub float_format: String,
    pub geo_format: String,
    pub date_format: String,
    pub clock_format: String,

    pub write_mode: WriteMode,

    /// File name template with `{table}` and `{segment}` placeholders
    pub file_template: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Ascii,
            segment_headers: true,
            segment_marker: DEFAULT_SEGMENT_MARKER,
            delimiter: DEFAULT_FIELD_DELIMITER.to_string(),
            columns: Vec::new(),
            swap_xy: false,
            skip: SkipRule::Never,
            float_format: DEFAULT_FLOAT_FORMAT.to_string(),
            geo_format: "D".to_string(),
            date_format: "yyyy-mm-dd".to_string(),
            clock_format: "hh:mm:ss".to_string(),
            write_mode: WriteMode::SingleStream,
            file_template: None,
        }
    }
}

/// Time system shared by input and output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// ISO epoch such as `1970-01-01T00:00:00`
    pub epoch: String,
    pub unit: TimeUnit,
    /// First year of the window two-digit years expand into
    pub y2k_offset_year: i32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_TIME_EPOCH.to_string(),
            unit: TimeUnit::Second,
            y2k_offset_year: DEFAULT_Y2K_OFFSET_YEAR,
        }
    }
}

impl TimeConfig {
    pub fn time_system(&self) -> Result<TimeSystem> {
        TimeSystem::from_epoch_str(&self.epoch, self.unit, self.y2k_offset_year)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Longitude framing used for normalization and as extent tie-break
    pub lon_range: LonRange,
}

/// Table assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Close open segments and detect polar caps
    pub polygon: bool,
    pub initial_segments: usize,
    pub initial_rows: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            polygon: false,
            initial_segments: INITIAL_SEGMENT_CAPACITY,
            initial_rows: INITIAL_ROW_CAPACITY,
        }
    }
}

/// Global configuration for table processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeotableConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub time: TimeConfig,
    pub geo: GeoConfig,
    pub assembly: AssemblyConfig,
}

impl GeotableConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::cannot_open(path.display().to_string(), e))?;
        let config: GeotableConfig =
            serde_json::from_str(&text).map_err(|e| Error::ConfigFile {
                path: path.display().to_string(),
                source: e,
            })?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/geotable/config.json`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geotable").join("config.json"))
    }

    /// Load an explicit file, else the default file if present, else defaults
    pub fn load_layered(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        if self.output.delimiter.is_empty() {
            return Err(Error::configuration("Output field delimiter is empty"));
        }
        if self.input.segment_marker.is_whitespace() || self.input.segment_marker == '#' {
            return Err(Error::configuration(format!(
                "Segment marker '{}' cannot be whitespace or the comment character",
                self.input.segment_marker
            )));
        }
        if let InputFormat::Binary { spec } = &self.input.format {
            BinaryRecordFormat::parse(spec, Direction::Read)?;
        }
        if let OutputFormat::Binary { spec } = &self.output.format {
            BinaryRecordFormat::parse(spec, Direction::Write)?;
        }
        if self.output.columns.len() > MAX_COLUMNS || self.input.select.len() > MAX_COLUMNS {
            return Err(Error::ColumnLimitExceeded {
                requested: self.output.columns.len().max(self.input.select.len()),
                limit: MAX_COLUMNS,
            });
        }
        if self.input.gaps.iter().any(|g| g.threshold.is_nan() || g.threshold < 0.0) {
            return Err(Error::configuration("Gap thresholds must be non-negative"));
        }
        if self.assembly.initial_rows == 0 || self.assembly.initial_segments == 0 {
            return Err(Error::configuration("Initial capacities must be at least 1"));
        }
        self.time.time_system()?;
        self.formatter()?;
        Ok(())
    }

    /// Scanner for the configured time system
    pub fn scanner(&self) -> Result<ValueScanner> {
        Ok(ValueScanner::new(self.time.time_system()?))
    }

    /// Formatter for the configured output templates
    pub fn formatter(&self) -> Result<ValueFormatter> {
        ValueFormatter::from_templates(
            &self.output.float_format,
            &self.output.geo_format,
            &self.output.date_format,
            &self.output.clock_format,
            self.time.time_system()?,
        )
    }

    /// Read binary records described by `spec`
    pub fn with_binary_input(mut self, spec: impl Into<String>) -> Self {
        self.input.format = InputFormat::Binary { spec: spec.into() };
        self
    }

    /// Write binary records described by `spec`
    pub fn with_binary_output(mut self, spec: impl Into<String>) -> Self {
        self.output.format = OutputFormat::Binary { spec: spec.into() };
        self
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.input.header_lines = header_lines;
        self
    }

    pub fn with_column_kinds(mut self, kinds: Vec<ColumnKind>) -> Self {
        self.input.kinds = kinds;
        self
    }

    /// Treat columns 0 and 1 as longitude and latitude
    pub fn with_geographic(mut self) -> Self {
        let mut kinds = self.input.kinds.clone();
        if kinds.len() < 2 {
            kinds.resize(2, ColumnKind::Float);
        }
        kinds[0] = ColumnKind::Longitude;
        kinds[1] = ColumnKind::Latitude;
        self.input.kinds = kinds;
        self
    }

    pub fn with_gap(mut self, gap: GapCriterion) -> Self {
        self.input.gaps.push(gap);
        self
    }

    pub fn with_polygon_mode(mut self) -> Self {
        self.assembly.polygon = true;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode, template: Option<String>) -> Self {
        self.output.write_mode = mode;
        self.output.file_template = template;
        self
    }

    pub fn with_strict_attributes(mut self) -> Self {
        self.input.strict_attributes = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_validates() {
        let config = GeotableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input.segment_marker, '>');
        assert_eq!(config.output.delimiter, "\t");
        assert!(config.output.segment_headers);
    }

    #[test]
    fn test_column_selection_parse() {
        let selection: ColumnSelection = "3+l+s2+o-1".parse().unwrap();
        assert_eq!(selection.source, 3);
        assert!(selection.log10);
        assert_eq!(selection.apply(100.0), 3.0);

        let plain: ColumnSelection = "0".parse().unwrap();
        assert_eq!(plain.apply(4.5), 4.5);
        assert!("x+l".parse::<ColumnSelection>().is_err());
        assert!("1+q".parse::<ColumnSelection>().is_err());
    }

    #[test]
    fn test_aspatial_mapping_parse() {
        let mapping: AspatialMapping = "2=depth".parse().unwrap();
        assert_eq!(mapping.column, 2);
        assert_eq!(mapping.name, "depth");
        assert!("2=".parse::<AspatialMapping>().is_err());
        assert!("depth".parse::<AspatialMapping>().is_err());
    }

    #[test]
    fn test_column_kinds_follow_selection() {
        let mut input = InputConfig::default();
        input.kinds = vec![ColumnKind::Longitude, ColumnKind::Latitude];
        assert_eq!(
            input.column_kinds(3),
            vec![ColumnKind::Longitude, ColumnKind::Latitude, ColumnKind::Float]
        );

        let mut time = ColumnSelection::new(4);
        time.kind = Some(ColumnKind::AbsTime);
        input.select = vec![ColumnSelection::new(1), time];
        assert_eq!(
            input.column_kinds(2),
            vec![ColumnKind::Longitude, ColumnKind::AbsTime]
        );
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = GeotableConfig::default();
        config.output.delimiter.clear();
        assert!(matches!(config.validate(), Err(Error::Configuration { .. })));

        let config = GeotableConfig::default().with_binary_input("3q");
        assert!(config.validate().is_err());

        let mut config = GeotableConfig::default();
        config.output.columns = vec![0; MAX_COLUMNS + 1];
        assert!(matches!(
            config.validate(),
            Err(Error::ColumnLimitExceeded { .. })
        ));

        let mut config = GeotableConfig::default();
        config.time.epoch = "not a date".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_json_with_partial_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "input": {
                    "format": {"binary": {"spec": "3d"}},
                    "gaps": [{"metric": {"column": 0}, "threshold": 5.0}]
                },
                "assembly": {"polygon": true}
            }"#,
        )
        .unwrap();

        let config = GeotableConfig::load(&path).unwrap();
        assert_eq!(
            config.input.format,
            InputFormat::Binary {
                spec: "3d".to_string()
            }
        );
        assert_eq!(config.input.gaps.len(), 1);
        assert!(config.assembly.polygon);
        assert_eq!(config.assembly.initial_rows, INITIAL_ROW_CAPACITY);
        assert_eq!(config.output.float_format, DEFAULT_FLOAT_FORMAT);
    }

    #[test]
    fn test_load_reports_bad_json_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = GeotableConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_load_layered_explicit_missing_file() {
        let err = GeotableConfig::load_layered(Some(Path::new("/nonexistent/geotable.json")))
            .unwrap_err();
        assert!(matches!(err, Error::CannotOpen { .. }));
    }
}
