//! Tests for binary record descriptors

use super::super::element::{ByteSwap, Direction, ElementType};
use super::super::record_format::{BinaryRead, BinaryRecordFormat, FormatItem};
use crate::Error;
use crate::constants::MAX_COLUMNS;

#[test]
fn test_parse_counts_and_types() {
    let format = BinaryRecordFormat::parse("2d1f", Direction::Read).unwrap();
    assert_eq!(format.n_columns(), 3);
    assert_eq!(format.record_width(), Some(20));

    let format = BinaryRecordFormat::parse("d,f,i", Direction::Read).unwrap();
    assert_eq!(format.n_columns(), 3);
    assert_eq!(format.record_width(), Some(16));
}

#[test]
fn test_parse_skip_items() {
    let format = BinaryRecordFormat::parse("4x2i", Direction::Read).unwrap();
    assert_eq!(format.n_columns(), 2);
    assert_eq!(format.items()[0], FormatItem::Skip(4));
    assert_eq!(format.record_width(), Some(12));
}

#[test]
fn test_parse_rejects_bad_descriptors() {
    assert!(matches!(
        BinaryRecordFormat::parse("3q", Direction::Read),
        Err(Error::UnsupportedTypeCode { code: 'q' })
    ));
    assert!(matches!(
        BinaryRecordFormat::parse("3", Direction::Read),
        Err(Error::InvalidFormat { .. })
    ));
    assert!(matches!(
        BinaryRecordFormat::parse("2d+z", Direction::Read),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn test_column_limit_rejected_before_io() {
    let descriptor = format!("{}d", MAX_COLUMNS + 1);
    assert!(matches!(
        BinaryRecordFormat::parse(&descriptor, Direction::Read),
        Err(Error::ColumnLimitExceeded { .. })
    ));

    let format = BinaryRecordFormat::uniform(
        ElementType::Float64,
        MAX_COLUMNS + 1,
        Direction::Read,
        ByteSwap::None,
    );
    let mut input: &[u8] = &[];
    let mut out = Vec::new();
    assert!(matches!(
        format.read_record(&mut input, &mut out),
        Err(Error::ColumnLimitExceeded { .. })
    ));
}

#[test]
fn test_huge_counts_rejected_while_parsing() {
    assert!(matches!(
        BinaryRecordFormat::parse("100000000000d", Direction::Read),
        Err(Error::ColumnLimitExceeded { limit: MAX_COLUMNS, .. })
    ));

    let split = format!("{}d{}f", MAX_COLUMNS - 1, 2);
    assert!(matches!(
        BinaryRecordFormat::parse(&split, Direction::Write),
        Err(Error::ColumnLimitExceeded { requested, .. }) if requested == MAX_COLUMNS + 1
    ));

    let full = format!("{}d", MAX_COLUMNS);
    assert_eq!(
        BinaryRecordFormat::parse(&full, Direction::Read).unwrap().n_columns(),
        MAX_COLUMNS
    );
}

#[test]
fn test_mixed_record_round_trip() {
    let writer = BinaryRecordFormat::parse("d,f,i,2x,h", Direction::Write).unwrap();
    let mut bytes = Vec::new();
    writer.write_record(&mut bytes, &[1.25, -0.5, 70000.0, -12.0]).unwrap();
    assert_eq!(bytes.len(), 8 + 4 + 4 + 2 + 2);

    let reader = BinaryRecordFormat::parse("d,f,i,2x,h", Direction::Read).unwrap();
    let mut input = bytes.as_slice();
    let mut record = Vec::new();
    assert_eq!(reader.read_record(&mut input, &mut record).unwrap(), BinaryRead::Complete);
    assert_eq!(record, vec![1.25, -0.5, 70000.0, -12.0]);
    assert_eq!(reader.read_record(&mut input, &mut record).unwrap(), BinaryRead::End);
}

#[test]
fn test_group_swap_round_trip() {
    let writer = BinaryRecordFormat::parse("2dw", Direction::Write).unwrap();
    let plain = BinaryRecordFormat::parse("2d", Direction::Write).unwrap();
    let mut swapped = Vec::new();
    let mut native = Vec::new();
    writer.write_record(&mut swapped, &[3.0, 4.0]).unwrap();
    plain.write_record(&mut native, &[3.0, 4.0]).unwrap();
    assert_ne!(swapped, native);
    swapped[..8].reverse();
    swapped[8..].reverse();
    assert_eq!(swapped, native);
}

#[test]
fn test_explicit_endianness() {
    let big = BinaryRecordFormat::parse("1i+b", Direction::Write).unwrap();
    let little = BinaryRecordFormat::parse("1i+l", Direction::Write).unwrap();
    let mut b = Vec::new();
    let mut l = Vec::new();
    big.write_record(&mut b, &[1.0]).unwrap();
    little.write_record(&mut l, &[1.0]).unwrap();
    assert_eq!(b, vec![0, 0, 0, 1]);
    assert_eq!(l, vec![1, 0, 0, 0]);
}

#[test]
fn test_partial_record_reports_columns_read() {
    let writer = BinaryRecordFormat::parse("3f", Direction::Write).unwrap();
    let mut bytes = Vec::new();
    writer.write_record(&mut bytes, &[1.0, 2.0, 3.0]).unwrap();
    bytes.truncate(6);

    let reader = BinaryRecordFormat::parse("3f", Direction::Read).unwrap();
    let mut input = bytes.as_slice();
    let mut record = Vec::new();
    assert_eq!(reader.read_record(&mut input, &mut record).unwrap(), BinaryRead::Partial(1));
    assert_eq!(record[0], 1.0);
    assert!(record[1].is_nan());
}

#[test]
fn test_ascii_record_written_as_line() {
    let writer = BinaryRecordFormat::parse("2A", Direction::Write).unwrap();
    let mut bytes = Vec::new();
    writer.write_record(&mut bytes, &[1.0, 2.5]).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "1 2.5 \n");
}
