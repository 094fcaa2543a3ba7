//! Record reader state machine
//!
//! One [`RecordReader`] owns all state of one input stream: the source, the
//! parse phase of the feature-attribute protocol, counters and the previous
//! record used for gap tests. Every call to [`RecordReader::next_event`]
//! yields exactly one [`RecordEvent`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace, warn};

use super::gap::GapDetector;
use super::source::RecordSource;
use crate::app::models::{ColumnKind, LonRange};
use crate::app::services::binary_codec::{BinaryRead, BinaryRecordFormat, Direction};
use crate::app::services::feature_attributes::{CommentOutcome, FeatureParser};
use crate::app::services::value_scan::ValueScanner;
use crate::config::{ColumnCount, GeotableConfig, InputConfig, InputFormat, NanPolicy};
use crate::constants::{COMMENT_CHAR, NAN_TEXT};
use crate::{Error, Result};

/// Where the reader is within its stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Leading header lines are still being consumed
    AwaitHeader,
    Streaming,
    /// A gap break was emitted and the record that caused it is held
    SegmentBoundary,
    Eof,
}

/// Why a segment ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// A line starting with the segment marker
    Marker,
    /// A record of NaN values
    NanRecord,
    BlankLine,
    /// A gap between consecutive records
    Gap,
}

/// Result of one read
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent {
    /// A table header line, verbatim
    TableHeader(String),
    /// A segment boundary; `header` is the text after the marker
    SegmentBreak {
        header: Option<String>,
        reason: BreakReason,
    },
    /// A data record is available from [`RecordReader::record`]
    Data,
    /// A data record whose field count differed from the expected count;
    /// the record is padded with NaN or cut to that count
    Mismatch { found: usize },
    EndOfFile,
}

/// Counters kept while reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub header_lines: u64,
    /// Data records returned
    pub records: u64,
    pub segment_breaks: u64,
    pub gaps: u64,
    /// Records with unreadable values or a wrong field count
    pub malformed: u64,
    /// Records dropped for latitudes outside -90..90
    pub bad_coordinates: u64,
    /// Records dropped by the NaN policy
    pub nan_skipped: u64,
    pub duplicates: u64,
}

enum Fetched {
    Line,
    Record(usize),
    Partial(usize),
    End,
}

/// Reader for one input stream
#[derive(Debug)]
pub struct RecordReader {
    source: RecordSource,
    name: String,
    state: ReaderState,
    options: InputConfig,
    lon_range: LonRange,
    scanner: ValueScanner,
    features: FeatureParser,
    gaps: GapDetector,
    /// Kind used to scan each source column
    source_kinds: Vec<ColumnKind>,
    /// Kind of each column after selection and axis swap
    kinds: Vec<ColumnKind>,
    expected_raw: Option<usize>,
    line: String,
    raw: Vec<f64>,
    record: Vec<f64>,
    held: Vec<f64>,
    held_event: Option<RecordEvent>,
    aspatial: Vec<(usize, f64)>,
    previous_xy: Option<(f64, f64)>,
    header_remaining: usize,
    position: u64,
    segment_number: u64,
    points_in_segment: u64,
    last_malformed: bool,
    malformed_reported: bool,
    file_bad: u64,
    file_malformed: u64,
    stats: ReadStats,
}

/// Kind of each source column, undoing the axis swap and the selection
fn source_kinds(options: &InputConfig) -> Vec<ColumnKind> {
    let mut selected = options.column_kinds(0);
    if options.swap_xy && selected.len() >= 2 {
        selected.swap(0, 1);
    }
    if options.select.is_empty() {
        return selected;
    }
    let width = options.select.iter().map(|s| s.source + 1).max().unwrap_or(0);
    let mut kinds = vec![ColumnKind::Float; width];
    for (i, selection) in options.select.iter().enumerate() {
        if let Some(kind) = selected.get(i) {
            kinds[selection.source] = *kind;
        }
    }
    kinds
}

impl RecordReader {
    /// Create a reader over `source`
    pub fn new(source: RecordSource, config: &GeotableConfig) -> Result<Self> {
        let options = config.input.clone();
        let scanner = config.scanner()?;
        let expected_raw = match (options.columns, source.declared_columns()) {
            (ColumnCount::Fixed(n), _) => Some(n),
            (ColumnCount::Unknown, declared) => declared,
            (ColumnCount::Any, _) => None,
        };
        let features = FeatureParser::new()
            .with_aspatial(
                options
                    .aspatial
                    .iter()
                    .map(|m| (m.column, m.name.clone()))
                    .collect(),
            )
            .with_strict(options.strict_attributes)
            .with_scanner(scanner);
        let gaps = GapDetector::new(options.gaps.clone(), options.gap_logic);
        let state = if source.is_ascii() {
            ReaderState::AwaitHeader
        } else {
            ReaderState::Streaming
        };
        debug!(
            "Opening {} record source with {} gap criteria, expected columns {:?}",
            source.kind_name(),
            options.gaps.len(),
            expected_raw
        );

        Ok(Self {
            name: source.kind_name().to_string(),
            source,
            state,
            source_kinds: source_kinds(&options),
            kinds: options.column_kinds(0),
            header_remaining: options.header_lines,
            lon_range: config.geo.lon_range,
            scanner,
            features,
            gaps,
            expected_raw,
            line: String::new(),
            raw: Vec::new(),
            record: Vec::new(),
            held: Vec::new(),
            held_event: None,
            aspatial: Vec::new(),
            previous_xy: None,
            position: 0,
            segment_number: 0,
            points_in_segment: 0,
            last_malformed: false,
            malformed_reported: false,
            file_bad: 0,
            file_malformed: 0,
            stats: ReadStats::default(),
            options,
        })
    }

    /// Create a reader over a byte stream in the configured input format
    pub fn from_reader(reader: impl BufRead + 'static, config: &GeotableConfig) -> Result<Self> {
        let source = match &config.input.format {
            InputFormat::Ascii => RecordSource::ascii(reader),
            InputFormat::Binary { spec } => {
                RecordSource::binary(reader, BinaryRecordFormat::parse(spec, Direction::Read)?)
            }
            InputFormat::Columnar => {
                return Err(Error::configuration(
                    "Columnar input is read from an in-memory array, not a byte stream",
                ));
            }
        };
        Self::new(source, config)
    }

    /// Open a file in the configured input format
    pub fn open(path: &Path, config: &GeotableConfig) -> Result<Self> {
        let file =
            File::open(path).map_err(|e| Error::cannot_open(path.display().to_string(), e))?;
        let reader = Self::from_reader(BufReader::new(file), config)?;
        Ok(reader.with_name(path.display().to_string()))
    }

    /// Name used in log messages
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// The record of the last `Data` or `Mismatch` event
    pub fn record(&self) -> &[f64] {
        &self.record
    }

    /// Columns per record once known
    pub fn n_columns(&self) -> Option<usize> {
        if self.options.select.is_empty() {
            self.expected_raw
        } else {
            Some(self.options.select.len())
        }
    }

    /// Semantic kind of every column of returned records
    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        self.options.column_kinds(self.n_columns().unwrap_or(0))
    }

    /// Segment breaks seen so far
    pub fn segment_number(&self) -> u64 {
        self.segment_number
    }

    /// Records returned since the last segment break
    pub fn points_in_segment(&self) -> u64 {
        self.points_in_segment
    }

    /// Whether the last returned record had unreadable values
    pub fn last_record_malformed(&self) -> bool {
        self.last_malformed
    }

    pub fn features(&self) -> &FeatureParser {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureParser {
        &mut self.features
    }

    /// Read the next event
    pub fn next_event(&mut self) -> Result<RecordEvent> {
        loop {
            match self.state {
                ReaderState::Eof => return Ok(RecordEvent::EndOfFile),
                ReaderState::SegmentBoundary => return Ok(self.release_held()),
                ReaderState::AwaitHeader | ReaderState::Streaming => {}
            }
            let event = match self.fetch()? {
                Fetched::End => return Ok(self.finish()),
                Fetched::Line => self.handle_line(),
                Fetched::Record(found) => self.handle_binary(found, false),
                Fetched::Partial(found) => self.handle_binary(found, true),
            };
            if let Some(event) = event {
                return Ok(event);
            }
        }
    }

    fn fetch(&mut self) -> Result<Fetched> {
        match &mut self.source {
            RecordSource::Ascii(reader) => {
                self.line.clear();
                let n = reader
                    .read_line(&mut self.line)
                    .map_err(|e| Error::io(format!("Failed to read line from {}", self.name), e))?;
                Ok(if n == 0 { Fetched::End } else { Fetched::Line })
            }
            RecordSource::Binary { reader, format } => {
                Ok(match format.read_record(reader.as_mut(), &mut self.raw)? {
                    BinaryRead::Complete => Fetched::Record(format.n_columns()),
                    BinaryRead::End => Fetched::End,
                    BinaryRead::Partial(found) => Fetched::Partial(found),
                })
            }
            RecordSource::Columnar { array, next } => {
                if *next >= array.n_records() {
                    return Ok(Fetched::End);
                }
                self.raw.clear();
                self.raw
                    .extend((0..array.n_variables()).map(|v| array.value(v, *next)));
                *next += 1;
                Ok(Fetched::Record(array.n_variables()))
            }
        }
    }

    fn handle_line(&mut self) -> Option<RecordEvent> {
        self.position += 1;
        let line = std::mem::take(&mut self.line);
        let event = self.classify_line(line.trim_end_matches(['\n', '\r']));
        self.line = line;
        event
    }

    fn classify_line(&mut self, text: &str) -> Option<RecordEvent> {
        let is_comment = text.starts_with(COMMENT_CHAR);
        if self.state == ReaderState::AwaitHeader {
            if self.header_remaining > 0 || is_comment {
                self.header_remaining = self.header_remaining.saturating_sub(1);
                if is_comment {
                    self.features.process_comment(text);
                }
                self.stats.header_lines += 1;
                return Some(RecordEvent::TableHeader(text.to_string()));
            }
            self.state = ReaderState::Streaming;
        }

        if is_comment {
            match self.features.process_comment(text) {
                CommentOutcome::Feature => self.aspatial = self.features.aspatial_values(),
                CommentOutcome::PassThrough => trace!("Skipping comment at line {}", self.position),
                CommentOutcome::Declaration | CommentOutcome::DataStart => {}
            }
            return None;
        }
        if let Some(rest) = text.strip_prefix(self.options.segment_marker) {
            let header = rest.trim();
            let header = (!header.is_empty()).then(|| header.to_string());
            return Some(self.segment_break(header, BreakReason::Marker));
        }
        if text.trim().is_empty() {
            if self.options.blank_line_breaks {
                return Some(self.segment_break(None, BreakReason::BlankLine));
            }
            return None;
        }

        let tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        if self.options.nan_record_breaks && tokens.iter().all(|t| t.eq_ignore_ascii_case(NAN_TEXT)) {
            return Some(self.segment_break(None, BreakReason::NanRecord));
        }

        self.last_malformed = false;
        self.raw.clear();
        for (col, token) in tokens.iter().enumerate() {
            let kind = self.source_kinds.get(col).copied().unwrap_or_default();
            match self.scanner.scan_column(token, kind) {
                Ok(value) => self.raw.push(value),
                Err(e) => {
                    self.report_malformed(&format!("column {}: {}", col, e));
                    self.raw.push(f64::NAN);
                }
            }
        }
        self.accept_record(tokens.len(), false)
    }

    fn handle_binary(&mut self, found: usize, partial: bool) -> Option<RecordEvent> {
        self.position += 1;
        self.last_malformed = false;
        if !partial
            && self.options.nan_record_breaks
            && self.raw.iter().all(|v| v.is_nan())
        {
            return Some(self.segment_break(None, BreakReason::NanRecord));
        }
        self.accept_record(found, partial)
    }

    /// Negotiate the column count, run the record pipeline and test for gaps
    fn accept_record(&mut self, found: usize, partial: bool) -> Option<RecordEvent> {
        let mismatch = match self.expected_raw {
            Some(expected) if found != expected || partial => Some(found),
            Some(_) => None,
            None if self.options.columns == ColumnCount::Any => partial.then_some(found),
            None => {
                debug!("{}: column count set to {} by the first record", self.name, found);
                self.expected_raw = Some(found);
                partial.then_some(found)
            }
        };
        if let Some(expected) = self.expected_raw {
            self.raw.resize(expected, f64::NAN);
        }
        if mismatch.is_some() {
            let expected = self.expected_raw.unwrap_or(found);
            self.report_malformed(&format!("found {} fields, expected {}", found, expected));
        }

        self.transform();
        if !self.passes_policies() {
            return None;
        }
        let event = match mismatch {
            Some(found) => RecordEvent::Mismatch { found },
            None => RecordEvent::Data,
        };

        if self.gaps.check(&self.record) && self.points_in_segment > 0 {
            std::mem::swap(&mut self.record, &mut self.held);
            self.held_event = Some(event);
            self.stats.gaps += 1;
            let gap = self.segment_break(None, BreakReason::Gap);
            self.gaps.check(&self.held);
            if self.held.len() >= 2 {
                self.previous_xy = Some((self.held[0], self.held[1]));
            }
            self.state = ReaderState::SegmentBoundary;
            return Some(gap);
        }
        self.count_record();
        Some(event)
    }

    /// Column selection, transforms, axis swap, longitude framing and
    /// aspatial injection
    fn transform(&mut self) {
        self.record.clear();
        if self.options.select.is_empty() {
            self.record.extend_from_slice(&self.raw);
        } else {
            for selection in &self.options.select {
                let value = self.raw.get(selection.source).copied().unwrap_or(f64::NAN);
                self.record.push(selection.apply(value));
            }
        }
        if self.options.swap_xy && self.record.len() >= 2 {
            self.record.swap(0, 1);
        }
        if self.options.normalize_longitudes {
            for (value, kind) in self.record.iter_mut().zip(&self.kinds) {
                if *kind == ColumnKind::Longitude {
                    *value = self.lon_range.adjust(*value);
                }
            }
        }
        for &(col, value) in &self.aspatial {
            if let Some(slot) = self.record.get_mut(col) {
                *slot = value;
            }
        }
    }

    fn passes_policies(&mut self) -> bool {
        let bad_latitude = self
            .record
            .iter()
            .zip(&self.kinds)
            .any(|(lat, kind)| *kind == ColumnKind::Latitude && lat.abs() > 90.0);
        if bad_latitude {
            self.stats.bad_coordinates += 1;
            self.file_bad += 1;
            debug!("{}: record {} has a latitude outside -90..90", self.name, self.position);
            return false;
        }

        let nan_dropped = match self.options.nan_policy {
            NanPolicy::Keep => false,
            NanPolicy::SkipXy => self.record.iter().take(2).any(|v| v.is_nan()),
            NanPolicy::SkipAny => self.record.iter().any(|v| v.is_nan()),
        };
        if nan_dropped {
            self.stats.nan_skipped += 1;
            return false;
        }

        if self.options.skip_duplicates && self.record.len() >= 2 {
            let xy = (self.record[0], self.record[1]);
            if self.previous_xy == Some(xy) {
                self.stats.duplicates += 1;
                return false;
            }
            self.previous_xy = Some(xy);
        }
        true
    }

    fn segment_break(&mut self, header: Option<String>, reason: BreakReason) -> RecordEvent {
        self.segment_number += 1;
        self.points_in_segment = 0;
        self.stats.segment_breaks += 1;
        self.gaps.reset();
        self.previous_xy = None;
        if reason == BreakReason::Marker {
            self.aspatial.clear();
        }
        trace!("{}: segment break {} ({:?})", self.name, self.segment_number, reason);
        RecordEvent::SegmentBreak { header, reason }
    }

    fn release_held(&mut self) -> RecordEvent {
        self.state = ReaderState::Streaming;
        std::mem::swap(&mut self.record, &mut self.held);
        self.count_record();
        self.held_event.take().unwrap_or(RecordEvent::Data)
    }

    fn count_record(&mut self) {
        self.points_in_segment += 1;
        self.stats.records += 1;
    }

    fn report_malformed(&mut self, detail: &str) {
        if !self.last_malformed {
            self.stats.malformed += 1;
            self.file_malformed += 1;
        }
        self.last_malformed = true;
        if !self.malformed_reported {
            self.malformed_reported = true;
            warn!(
                "{}: malformed record {} ({}). Check the column count, the column kinds \
                 and that fields are separated by spaces, tabs or commas",
                self.name, self.position, detail
            );
        } else {
            debug!("{}: malformed record {} ({})", self.name, self.position, detail);
        }
    }

    fn finish(&mut self) -> RecordEvent {
        self.state = ReaderState::Eof;
        if self.file_bad > 0 {
            warn!(
                "{}: {} records rejected for invalid coordinates",
                self.name, self.file_bad
            );
            self.file_bad = 0;
        }
        if self.file_malformed > 1 {
            warn!("{}: {} malformed records in total", self.name, self.file_malformed);
        }
        self.file_malformed = 0;
        debug!(
            "{}: end of input after {} records in {} segment breaks",
            self.name, self.stats.records, self.stats.segment_breaks
        );
        RecordEvent::EndOfFile
    }
}
