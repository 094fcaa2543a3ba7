//! Command implementations for the geotable CLI
//!
//! Each command layers its arguments over the loaded configuration, then
//! drives the library: `info` and `convert` through the reader, assembler
//! and writer, `swap` through the chunked byteswap passthrough.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::app::models::{ColumnKind, Dataset, WriteMode};
use crate::app::services::binary_codec::swap_stream;
use crate::app::services::record_io::RecordReader;
use crate::app::services::table_assembly::TableAssembler;
use crate::app::services::table_output::DatasetWriter;
use crate::app::services::value_scan::ValueFormatter;
use crate::cli::args::{Args, Commands, CommonArgs, ConvertArgs, InfoArgs, InputArgs, SwapArgs};
use crate::config::GeotableConfig;

/// Run the selected command
pub fn run(args: Args) -> Result<()> {
    let Some(command) = args.command else {
        anyhow::bail!("No command given; run `geotable --help` for usage");
    };
    setup_logging(command.common());
    debug!("Command line arguments: {:?}", command);

    match &command {
        Commands::Info(args) => run_info(args),
        Commands::Convert(args) => run_convert(args),
        Commands::Swap(args) => run_swap(args),
    }
}

/// Install the tracing subscriber for the chosen verbosity
fn setup_logging(common: &CommonArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = common.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("geotable={}", log_level)));

    let result = if common.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(io::stderr),
            )
            .try_init()
    };
    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load the configuration file (explicit or default) under the CLI options
fn load_configuration(common: &CommonArgs) -> Result<GeotableConfig> {
    let config = GeotableConfig::load_layered(common.config_file.as_deref())
        .context("Failed to load configuration")?;
    Ok(config)
}

/// Expand glob patterns into a sorted, de-duplicated file list
///
/// Plain paths are kept even when they do not exist so that opening them
/// reports the missing file by name.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("Invalid input pattern '{}'", pattern))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        if matched.is_empty() {
            anyhow::bail!("No files match '{}'", pattern);
        }
        matched.sort();
        paths.extend(matched);
    }
    let mut seen = std::collections::HashSet::new();
    paths.retain(|path| seen.insert(path.clone()));
    Ok(paths)
}

/// Readers for every input, or standard input when none were named
fn open_readers(input: &InputArgs, config: &GeotableConfig) -> Result<Vec<RecordReader>> {
    let paths = expand_inputs(&input.inputs)?;
    if paths.is_empty() {
        info!("Reading from standard input");
        let reader = RecordReader::from_reader(io::stdin().lock(), config)
            .context("Failed to read standard input")?;
        return Ok(vec![reader.with_name("<stdin>")]);
    }
    paths
        .iter()
        .map(|path| {
            RecordReader::open(path, config)
                .with_context(|| format!("Failed to open {}", path.display()))
        })
        .collect()
}

fn read_dataset(input: &InputArgs, config: &GeotableConfig) -> Result<Option<Dataset>> {
    let readers = open_readers(input, config)?;
    let n_readers = readers.len();
    let dataset = TableAssembler::new(config)
        .read_dataset(readers)
        .context("Failed to assemble tables")?;
    debug!("Read {} inputs", n_readers);
    Ok(dataset)
}

/// Render `min .. max` for one column in that column's output format
fn format_extent(formatter: &ValueFormatter, kind: ColumnKind, min: f64, max: f64) -> String {
    format!(
        "{} .. {}",
        formatter.format_value(min, kind),
        formatter.format_value(max, kind)
    )
}

fn print_extents(
    formatter: &ValueFormatter,
    kinds: &[ColumnKind],
    min: &[f64],
    max: &[f64],
    indent: &str,
) {
    for (col, (lo, hi)) in min.iter().zip(max).enumerate() {
        let kind = kinds.get(col).copied().unwrap_or_default();
        println!(
            "{}{} {}",
            indent,
            format!("col {} ({:?}):", col, kind).bright_cyan(),
            format_extent(formatter, kind, *lo, *hi)
        );
    }
}

fn run_info(args: &InfoArgs) -> Result<()> {
    let mut config = load_configuration(&args.common)?;
    args.input.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let Some(dataset) = read_dataset(&args.input, &config)? else {
        println!("{}", "No data records or segment headers found".bright_yellow());
        return Ok(());
    };
    let formatter = config.formatter()?;
    let kinds = config.input.column_kinds(dataset.n_columns());

    println!(
        "{} {} tables, {} segments, {} records, {} columns",
        "Dataset:".bright_green().bold(),
        dataset.n_tables().to_string().bright_white().bold(),
        dataset.n_segments().to_string().bright_white().bold(),
        dataset.n_records().to_string().bright_white().bold(),
        dataset.n_columns()
    );
    print_extents(&formatter, &kinds, dataset.min(), dataset.max(), "  ");

    for table in dataset.tables() {
        println!(
            "{} {}: {} segments, {} records",
            "Table".bright_cyan(),
            table.id,
            table.n_segments(),
            table.n_records()
        );
        if let Some(schema) = &table.schema {
            let geometry = schema
                .geometry
                .map(|g| g.to_string())
                .unwrap_or_else(|| "unspecified".to_string());
            println!(
                "  {} {} geometry, fields: {}",
                "Features:".bright_cyan(),
                geometry,
                schema.names.join(", ")
            );
        }
        if !args.segments {
            continue;
        }
        for (index, segment) in table.segments().iter().enumerate() {
            println!(
                "  {} {} [{} rows] {}",
                "Segment".bright_cyan(),
                index,
                segment.n_rows(),
                segment.header.as_deref().unwrap_or("").dimmed()
            );
            print_extents(&formatter, &kinds, segment.min(), segment.max(), "    ");
        }
    }
    Ok(())
}

fn run_convert(args: &ConvertArgs) -> Result<()> {
    let start = Instant::now();
    args.validate().context("Invalid arguments")?;
    let mut config = load_configuration(&args.common)?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let Some(dataset) = read_dataset(&args.input, &config)? else {
        info!("Nothing to convert");
        return Ok(());
    };
    let writer = DatasetWriter::new(&config).context("Invalid output settings")?;

    let stats = if args.output.is_none() && writer.write_mode() == WriteMode::SingleStream {
        let stdout = io::stdout();
        let mut sink = BufWriter::new(stdout.lock());
        let stats = writer
            .write_stream(&dataset, &mut sink)
            .context("Failed to write to standard output")?;
        sink.flush().context("Failed to flush standard output")?;
        stats
    } else {
        writer.write_files(&dataset).context("Failed to write output")?
    };

    if args.common.show_progress() && args.output.is_some() {
        eprintln!(
            "{} {} in {}",
            "Converted".bright_green().bold(),
            stats,
            HumanDuration(start.elapsed())
        );
    }
    Ok(())
}

fn swap_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Byte-swap `input` into `output`, reporting progress per chunk
pub fn swap_file(
    input: &Path,
    output: &Path,
    width: usize,
    skip: usize,
    progress: Option<&ProgressBar>,
) -> Result<u64> {
    let source = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let target =
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut reader = BufReader::new(source);
    let mut writer = BufWriter::new(target);

    let mut on_chunk = |bytes: u64| {
        if let Some(pb) = progress {
            pb.set_position(bytes);
        }
    };
    let summary = swap_stream(&mut reader, &mut writer, width, skip, &mut on_chunk)
        .with_context(|| format!("Failed to swap {}", input.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Swapped {} elements of {} bytes from {} to {}",
        summary.elements,
        width,
        input.display(),
        output.display()
    );
    Ok(summary.bytes(width))
}

fn run_swap(args: &SwapArgs) -> Result<()> {
    args.validate().context("Invalid arguments")?;
    let start = Instant::now();
    let total = std::fs::metadata(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?
        .len();

    let progress = args.common.show_progress().then(|| swap_progress_bar(total));
    let bytes = swap_file(&args.input, &args.output, args.width, args.skip, progress.as_ref())?;
    if let Some(pb) = &progress {
        pb.finish_with_message("done");
        eprintln!(
            "{} {} bytes in {}",
            "Swapped".bright_green().bold(),
            bytes,
            HumanDuration(start.elapsed())
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_expand_inputs() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.txt", "c.dat"] {
            fs::write(dir.path().join(name), "1 2\n").unwrap();
        }
        let pattern = dir.path().join("*.txt").to_string_lossy().into_owned();
        let plain = dir.path().join("a.txt").to_string_lossy().into_owned();

        let paths = expand_inputs(&[pattern, plain]).unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );
    }

    #[test]
    fn test_unmatched_pattern_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.none").to_string_lossy().into_owned();
        assert!(expand_inputs(&[pattern]).is_err());
        assert_eq!(
            expand_inputs(&["missing.txt".to_string()]).unwrap(),
            vec![PathBuf::from("missing.txt")]
        );
    }

    #[test]
    fn test_format_extent() {
        let formatter = ValueFormatter::default();
        assert_eq!(
            format_extent(&formatter, ColumnKind::Float, -1.5, 2.0),
            "-1.5 .. 2"
        );
    }

    #[test]
    fn test_swap_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.bin");
        let swapped = dir.path().join("swapped.bin");
        let restored = dir.path().join("restored.bin");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f64.to_ne_bytes());
        bytes.extend_from_slice(&7.25f64.to_ne_bytes());
        fs::write(&input, &bytes).unwrap();

        assert_eq!(swap_file(&input, &swapped, 8, 0, None).unwrap(), 16);
        let once = fs::read(&swapped).unwrap();
        assert_eq!(once[8..16], {
            let mut reversed = 7.25f64.to_ne_bytes();
            reversed.reverse();
            reversed
        });
        swap_file(&swapped, &restored, 8, 0, None).unwrap();
        assert_eq!(fs::read(&restored).unwrap(), bytes);
    }
}
