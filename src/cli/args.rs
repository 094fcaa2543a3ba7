//! Command-line argument definitions for geotable
//!
//! The CLI is defined with the clap derive API. Options that shape how
//! tables are read are shared by `info` and `convert`; each maps onto a
//! field of [`GeotableConfig`] through [`InputArgs::apply`] and
//! [`ConvertArgs::apply`].

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::app::models::{LonRange, WriteMode};
use crate::app::services::record_io::{GapCriterion, GapLogic, SkipRule};
use crate::config::{AspatialMapping, ColumnCount, ColumnSelection, GeotableConfig, NanPolicy};
use crate::{Error, Result};

/// Read, inspect and convert multi-segment geospatial tables
#[derive(Debug, Clone, Parser)]
#[command(
    name = "geotable",
    version,
    about = "Read, inspect and convert multi-segment geospatial data tables",
    long_about = "Reads ASCII or binary record tables made of segments separated by marker \
                  lines (or NaN records in binary streams), with optional @-tagged feature \
                  attributes, and writes them back out in either encoding."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Report table, segment and record counts with per-column extents
    Info(InfoArgs),
    /// Convert tables between ASCII and binary record layouts
    Convert(ConvertArgs),
    /// Byte-swap every fixed-width element of a binary file
    Swap(SwapArgs),
}

/// Options common to every command
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct CommonArgs {
    /// Path to a JSON configuration file
    ///
    /// When omitted, `<config dir>/geotable/config.json` is used if it exists.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only report errors; overrides --verbose
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl CommonArgs {
    /// Log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Longitude framing accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LonFraming {
    /// -180 to 180
    Signed,
    /// 0 to 360
    Positive,
}

impl From<LonFraming> for LonRange {
    fn from(framing: LonFraming) -> Self {
        match framing {
            LonFraming::Signed => LonRange::Minus180To180,
            LonFraming::Positive => LonRange::ZeroTo360,
        }
    }
}

/// How `convert` splits its output into files
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitMode {
    /// Everything in one stream or file
    None,
    /// One file per input table
    Table,
    /// One file per segment
    Segment,
}

impl From<SplitMode> for WriteMode {
    fn from(mode: SplitMode) -> Self {
        match mode {
            SplitMode::None => WriteMode::SingleStream,
            SplitMode::Table => WriteMode::PerTable,
            SplitMode::Segment => WriteMode::PerSegment,
        }
    }
}

/// Options describing how input tables are read
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct InputArgs {
    /// Input files or glob patterns; standard input when none are given
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Binary input layout, e.g. `3d`, `2f1iw` or `d+b`
    #[arg(short = 'b', long = "binary", value_name = "FORMAT")]
    pub binary: Option<String>,

    /// Number of header lines preceding the data of each file
    #[arg(long = "header-lines", value_name = "N")]
    pub header_lines: Option<usize>,

    /// Number of columns every record must carry
    #[arg(long = "columns", value_name = "N")]
    pub columns: Option<usize>,

    /// Input column selection, e.g. `1,0,2+s1000+o-5`
    #[arg(short = 'i', long = "select", value_name = "COLS", value_delimiter = ',')]
    pub select: Vec<ColumnSelection>,

    /// Treat columns 0 and 1 as longitude and latitude
    #[arg(short = 'g', long = "geographic")]
    pub geographic: bool,

    /// Input has latitude before longitude
    #[arg(long = "swap-xy")]
    pub swap_xy: bool,

    /// Close every segment into a polygon
    #[arg(long = "polygon")]
    pub polygon: bool,

    /// Gap criteria starting a new segment, e.g. `x5`, `D10` or `2z+1`
    #[arg(long = "gap", value_name = "GAP")]
    pub gaps: Vec<GapCriterion>,

    /// Require every gap criterion to fire instead of any
    #[arg(long = "gap-all")]
    pub gap_all: bool,

    /// Blank lines end the current segment
    #[arg(long = "blank-breaks")]
    pub blank_breaks: bool,

    /// All-NaN records end the current segment
    #[arg(long = "nan-breaks")]
    pub nan_breaks: bool,

    /// Drop records whose first two columns hold a NaN
    #[arg(long = "skip-nan-xy")]
    pub skip_nan_xy: bool,

    /// Drop records repeating the previous coordinates
    #[arg(long = "skip-duplicates")]
    pub skip_duplicates: bool,

    /// Feature attributes replacing data columns, e.g. `2=depth`
    #[arg(short = 'a', long = "aspatial", value_name = "COL=NAME", value_delimiter = ',')]
    pub aspatial: Vec<AspatialMapping>,

    /// Longitude framing used for extents
    #[arg(long = "lon-range", value_enum)]
    pub lon_range: Option<LonFraming>,
}

impl InputArgs {
    /// Layer the read options over `config`
    pub fn apply(&self, config: &mut GeotableConfig) {
        if let Some(spec) = &self.binary {
            *config = config.clone().with_binary_input(spec.clone());
        }
        if let Some(n) = self.header_lines {
            config.input.header_lines = n;
        }
        if let Some(n) = self.columns {
            config.input.columns = ColumnCount::Fixed(n);
        }
        if !self.select.is_empty() {
            config.input.select = self.select.clone();
        }
        if self.geographic {
            *config = config.clone().with_geographic();
        }
        config.input.swap_xy |= self.swap_xy;
        config.assembly.polygon |= self.polygon;
        config.input.gaps.extend(self.gaps.iter().cloned());
        if self.gap_all {
            config.input.gap_logic = GapLogic::All;
        }
        config.input.blank_line_breaks |= self.blank_breaks;
        config.input.nan_record_breaks |= self.nan_breaks;
        if self.skip_nan_xy {
            config.input.nan_policy = NanPolicy::SkipXy;
        }
        config.input.skip_duplicates |= self.skip_duplicates;
        if !self.aspatial.is_empty() {
            config.input.aspatial = self.aspatial.clone();
        }
        if let Some(framing) = self.lon_range {
            config.geo.lon_range = framing.into();
        }
    }
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct InfoArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub input: InputArgs,

    /// List every segment with its header and extent
    #[arg(long = "segments")]
    pub segments: bool,
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub input: InputArgs,

    /// Output file, or a template with `{table}` / `{segment}` when splitting
    ///
    /// Standard output when omitted.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<String>,

    /// Binary output layout; `d` alone writes every column as doubles
    #[arg(long = "binary-out", value_name = "FORMAT")]
    pub binary_out: Option<String>,

    /// Output column order, e.g. `2,0,1`
    #[arg(long = "out-columns", value_name = "COLS", value_delimiter = ',')]
    pub out_columns: Vec<usize>,

    /// Write latitude before longitude
    #[arg(long = "out-swap-xy")]
    pub out_swap_xy: bool,

    /// ASCII field delimiter
    #[arg(long = "delimiter", value_name = "TEXT")]
    pub delimiter: Option<String>,

    /// printf-style template for floating point values
    #[arg(long = "float-format", value_name = "TEMPLATE")]
    pub float_format: Option<String>,

    /// Template for geographic values, e.g. `ddd:mm:ss` or `D`
    #[arg(long = "geo-format", value_name = "TEMPLATE")]
    pub geo_format: Option<String>,

    /// Omit segment headers from the output
    #[arg(long = "no-segment-headers")]
    pub no_segment_headers: bool,

    /// Skip rows holding any NaN value
    #[arg(long = "skip-nan")]
    pub skip_nan: bool,

    /// Split output into one file per table or per segment
    #[arg(long = "split", value_enum)]
    pub split: Option<SplitMode>,
}

impl ConvertArgs {
    /// Check the options make sense together
    pub fn validate(&self) -> Result<()> {
        let splitting = self.split.is_some_and(|mode| mode != SplitMode::None);
        if splitting && self.output.is_none() {
            return Err(Error::configuration(
                "Splitting output into files needs --output with a file template",
            ));
        }
        Ok(())
    }

    /// Layer the read and write options over `config`
    pub fn apply(&self, config: &mut GeotableConfig) {
        self.input.apply(config);
        if let Some(spec) = &self.binary_out {
            *config = config.clone().with_binary_output(spec.clone());
        }
        if !self.out_columns.is_empty() {
            config.output.columns = self.out_columns.clone();
        }
        config.output.swap_xy |= self.out_swap_xy;
        if let Some(delimiter) = &self.delimiter {
            config.output.delimiter = delimiter.clone();
        }
        if let Some(template) = &self.float_format {
            config.output.float_format = template.clone();
        }
        if let Some(template) = &self.geo_format {
            config.output.geo_format = template.clone();
        }
        if self.no_segment_headers {
            config.output.segment_headers = false;
        }
        if self.skip_nan {
            config.output.skip = SkipRule::AnyNan;
        }
        let mode = self.split.map(WriteMode::from).unwrap_or_default();
        *config = config.clone().with_write_mode(mode, self.output.clone());
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SwapArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Binary file to swap
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination file
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: PathBuf,

    /// Element width in bytes (2, 4 or 8)
    #[arg(short = 'w', long = "width", default_value_t = 8)]
    pub width: usize,

    /// Leading bytes copied without swapping
    #[arg(long = "skip", default_value_t = 0)]
    pub skip: usize,
}

impl SwapArgs {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.width, 2 | 4 | 8) {
            return Err(Error::configuration(format!(
                "Element width must be 2, 4 or 8 bytes, got {}",
                self.width
            )));
        }
        if self.input == self.output {
            return Err(Error::configuration(
                "Swapping in place is not supported; choose a different output file",
            ));
        }
        Ok(())
    }
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Info(args) => &args.common,
            Commands::Convert(args) => &args.common,
            Commands::Swap(args) => &args.common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::record_io::GapMetric;
    use crate::config::OutputFormat;

    fn parse(argv: &[&str]) -> Commands {
        Args::try_parse_from(argv).unwrap().command.unwrap()
    }

    #[test]
    fn test_log_level() {
        let mut common = CommonArgs::default();
        assert_eq!(common.get_log_level(), "warn");
        common.verbose = 2;
        assert_eq!(common.get_log_level(), "debug");
        common.verbose = 5;
        assert_eq!(common.get_log_level(), "trace");
        common.quiet = true;
        assert_eq!(common.get_log_level(), "error");
        assert!(!common.show_progress());
    }

    #[test]
    fn test_info_arguments() {
        let Commands::Info(info) = parse(&[
            "geotable", "info", "a.txt", "b*.txt", "-g", "--gap", "x5", "--gap", "D10", "-vv",
        ]) else {
            panic!("expected info");
        };
        assert_eq!(info.input.inputs, vec!["a.txt", "b*.txt"]);
        assert!(info.input.geographic);
        assert_eq!(info.input.gaps.len(), 2);
        assert_eq!(info.input.gaps[1].metric, GapMetric::GreatCircle);
        assert_eq!(info.common.verbose, 2);
    }

    #[test]
    fn test_input_args_apply() {
        let Commands::Info(info) = parse(&[
            "geotable", "info", "--binary", "3d", "--select", "1,0", "--polygon",
            "--lon-range", "positive", "--skip-nan-xy",
        ]) else {
            panic!("expected info");
        };
        let mut config = GeotableConfig::default();
        info.input.apply(&mut config);
        assert_eq!(config.input.select.len(), 2);
        assert_eq!(config.input.select[0].source, 1);
        assert!(config.assembly.polygon);
        assert_eq!(config.geo.lon_range, LonRange::ZeroTo360);
        assert_eq!(config.input.nan_policy, NanPolicy::SkipXy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_convert_args_apply() {
        let Commands::Convert(convert) = parse(&[
            "geotable", "convert", "in.txt", "--binary-out", "d", "--out-columns", "1,0",
            "--split", "segment", "-o", "out_{table}_{segment}.bin",
        ]) else {
            panic!("expected convert");
        };
        assert!(convert.validate().is_ok());
        let mut config = GeotableConfig::default();
        convert.apply(&mut config);
        assert_eq!(
            config.output.format,
            OutputFormat::Binary {
                spec: "d".to_string()
            }
        );
        assert_eq!(config.output.columns, vec![1, 0]);
        assert_eq!(config.output.write_mode, WriteMode::PerSegment);
        assert_eq!(
            config.output.file_template.as_deref(),
            Some("out_{table}_{segment}.bin")
        );
    }

    #[test]
    fn test_split_requires_output() {
        let Commands::Convert(convert) = parse(&["geotable", "convert", "--split", "table"]) else {
            panic!("expected convert");
        };
        assert!(convert.validate().is_err());
    }

    #[test]
    fn test_swap_validation() {
        let Commands::Swap(swap) = parse(&["geotable", "swap", "in.bin", "-o", "out.bin", "-w", "4"])
        else {
            panic!("expected swap");
        };
        assert!(swap.validate().is_ok());

        let mut bad = swap.clone();
        bad.width = 3;
        assert!(bad.validate().is_err());
        bad.width = 8;
        bad.output = bad.input.clone();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_bad_gap_is_rejected_by_parser() {
        assert!(Args::try_parse_from(["geotable", "info", "--gap", "q7"]).is_err());
    }
}
