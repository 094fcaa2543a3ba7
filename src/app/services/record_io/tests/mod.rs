//! Tests for record reading and writing

use std::io::Cursor;

use super::reader::{RecordEvent, RecordReader};
use crate::config::GeotableConfig;

mod gap_tests;
mod segment_header_tests;

/// Reader over in-memory ASCII text
pub fn ascii_reader(text: &str, config: &GeotableConfig) -> RecordReader {
    RecordReader::from_reader(Cursor::new(text.to_string()), config).unwrap()
}

/// Drain a reader, pairing each event with the record it exposes
pub fn drain(reader: &mut RecordReader) -> Vec<(RecordEvent, Vec<f64>)> {
    let mut events = Vec::new();
    loop {
        let event = reader.next_event().unwrap();
        let record = match event {
            RecordEvent::Data | RecordEvent::Mismatch { .. } => reader.record().to_vec(),
            _ => Vec::new(),
        };
        let done = event == RecordEvent::EndOfFile;
        events.push((event, record));
        if done {
            return events;
        }
    }
}

/// Records of all data events, in order
pub fn data_records(events: &[(RecordEvent, Vec<f64>)]) -> Vec<Vec<f64>> {
    events
        .iter()
        .filter(|(e, _)| matches!(e, RecordEvent::Data | RecordEvent::Mismatch { .. }))
        .map(|(_, r)| r.clone())
        .collect()
}

/// Compare records where NaN equals NaN
pub fn same_record(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}
