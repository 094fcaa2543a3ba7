//! Tests for grid-row layouts

use super::super::element::{ByteSwap, ElementType};
use super::super::grid_format::GridFormat;
use crate::Error;

fn sample() -> Vec<f64> {
    // 3 columns x 2 rows, row-major from the top-left
    vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
}

#[test]
fn test_parse_orientations() {
    let tl = GridFormat::parse("TLf").unwrap();
    assert!(tl.row_major && tl.top_down && tl.left_right);
    assert_eq!(tl.element, ElementType::Float32);

    let bl = GridFormat::parse("BLd").unwrap();
    assert!(bl.row_major && !bl.top_down && bl.left_right);

    let lt = GridFormat::parse("LTh").unwrap();
    assert!(!lt.row_major && lt.top_down && lt.left_right);

    let tr = GridFormat::parse("TRa").unwrap();
    assert!(tr.row_major && !tr.left_right);
    assert_eq!(tr.element, ElementType::AsciiToken);
}

#[test]
fn test_parse_modifiers() {
    let format = GridFormat::parse("TLfxys16w").unwrap();
    assert!(format.missing_x && format.missing_y);
    assert_eq!(format.skip, 16);
    assert_eq!(format.swap, ByteSwap::Both);

    assert!(matches!(GridFormat::parse("TTf"), Err(Error::InvalidFormat { .. })));
    assert!(matches!(GridFormat::parse("TLfs"), Err(Error::InvalidFormat { .. })));
    assert!(matches!(GridFormat::parse("TLfq"), Err(Error::InvalidFormat { .. })));
}

#[test]
fn test_bottom_up_storage_order() {
    let format = GridFormat::parse("BLd").unwrap();
    let mut bytes = Vec::new();
    format.write_grid(&mut bytes, &sample(), 3, 2).unwrap();
    let stored: Vec<f64> = bytes
        .chunks_exact(8)
        .map(|b| f64::from_ne_bytes(b.try_into().unwrap()))
        .collect();
    assert_eq!(stored, vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_column_major_storage_order() {
    let format = GridFormat::parse("LTd").unwrap();
    let mut bytes = Vec::new();
    format.write_grid(&mut bytes, &sample(), 3, 2).unwrap();
    let stored: Vec<f64> = bytes
        .chunks_exact(8)
        .map(|b| f64::from_ne_bytes(b.try_into().unwrap()))
        .collect();
    assert_eq!(stored, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_every_orientation_round_trips() {
    for descriptor in ["TLd", "TRd", "BLd", "BRd", "LTd", "LBd", "RTd", "RBd", "TLiw"] {
        let format = GridFormat::parse(descriptor).unwrap();
        let mut bytes = Vec::new();
        format.write_grid(&mut bytes, &sample(), 3, 2).unwrap();
        let grid = format.read_grid(&mut bytes.as_slice(), 3, 2).unwrap();
        assert_eq!(grid, sample(), "{}", descriptor);
    }
}

#[test]
fn test_missing_edges_are_reconstructed() {
    // West column repeats in the east, north row repeats in the south
    let full = vec![1.0, 2.0, 1.0, 3.0, 4.0, 3.0, 1.0, 2.0, 1.0];
    let format = GridFormat::parse("TLfxy").unwrap();
    let mut bytes = Vec::new();
    format.write_grid(&mut bytes, &full, 3, 3).unwrap();
    assert_eq!(bytes.len(), 4 * 4);
    let grid = format.read_grid(&mut bytes.as_slice(), 3, 3).unwrap();
    assert_eq!(grid, full);
}

#[test]
fn test_skip_bytes() {
    let format = GridFormat::parse("TLus3").unwrap();
    let bytes: Vec<u8> = vec![9, 9, 9, 1, 2, 3, 4];
    let grid = format.read_grid(&mut bytes.as_slice(), 2, 2).unwrap();
    assert_eq!(grid, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_truncated_grid_is_short_read() {
    let format = GridFormat::parse("TLu").unwrap();
    let bytes: Vec<u8> = vec![1, 2, 3];
    assert!(matches!(
        format.read_grid(&mut bytes.as_slice(), 2, 2),
        Err(Error::ShortRead { expected: 4, got: 3 })
    ));
}

#[test]
fn test_write_rejects_wrong_size() {
    let format = GridFormat::default();
    let mut bytes = Vec::new();
    assert!(format.write_grid(&mut bytes, &[1.0, 2.0], 3, 2).is_err());
}
