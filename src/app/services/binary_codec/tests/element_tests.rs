//! Tests for single-element codecs

use super::super::element::{ByteSwap, Direction, ElementCodec, ElementType};
use super::{FIXED_TYPES, round_trip};
use crate::Error;

#[test]
fn test_type_codes() {
    for code in ['c', 'u', 'h', 'H', 'i', 'I', 'l', 'L', 'f', 'd', 'a', 'A'] {
        let element = ElementType::from_code(code).unwrap();
        assert_eq!(element.code(), code);
    }
    assert!(matches!(
        ElementType::from_code('q'),
        Err(Error::UnsupportedTypeCode { code: 'q' })
    ));
}

#[test]
fn test_widths() {
    assert_eq!(ElementType::Int8.width(), Some(1));
    assert_eq!(ElementType::UInt16.width(), Some(2));
    assert_eq!(ElementType::Float32.width(), Some(4));
    assert_eq!(ElementType::UInt64.width(), Some(8));
    assert_eq!(ElementType::AsciiFree.width(), None);
}

#[test]
fn test_round_trip_with_and_without_swap() {
    let samples = [0.0, 1.0, 42.0, 127.0, -3.0, -128.0];
    for element in FIXED_TYPES {
        for swap in [ByteSwap::None, ByteSwap::Both] {
            for value in samples {
                let unsigned = matches!(
                    element,
                    ElementType::UInt8 | ElementType::UInt16 | ElementType::UInt32 | ElementType::UInt64
                );
                if unsigned && value < 0.0 {
                    continue;
                }
                assert_eq!(round_trip(element, swap, value), value, "{:?} {:?}", element, swap);
            }
        }
    }
}

#[test]
fn test_extreme_values_round_trip() {
    assert_eq!(round_trip(ElementType::Int16, ByteSwap::Both, i16::MIN as f64), i16::MIN as f64);
    assert_eq!(round_trip(ElementType::UInt32, ByteSwap::Both, u32::MAX as f64), u32::MAX as f64);
    assert_eq!(round_trip(ElementType::Float64, ByteSwap::Both, f64::MAX), f64::MAX);
    assert_eq!(round_trip(ElementType::Float32, ByteSwap::None, 0.15625), 0.15625);
}

#[test]
fn test_swapping_twice_is_identity() {
    let plain = ElementCodec::new(ElementType::Float64, Direction::Write, ByteSwap::None);
    let swapped = ElementCodec::new(ElementType::Float64, Direction::Write, ByteSwap::Output);
    let mut bytes = swapped.encode(123.456);
    bytes.reverse();
    assert_eq!(bytes, plain.encode(123.456));
}

#[test]
fn test_swap_direction_applies() {
    assert!(ElementCodec::new(ElementType::Int32, Direction::Read, ByteSwap::Input).swap);
    assert!(!ElementCodec::new(ElementType::Int32, Direction::Write, ByteSwap::Input).swap);
    assert!(ElementCodec::new(ElementType::Int32, Direction::Write, ByteSwap::Output).swap);
    assert!(!ElementCodec::new(ElementType::AsciiToken, Direction::Read, ByteSwap::Both).swap);
}

#[test]
fn test_integer_encoding_rounds_and_saturates() {
    assert_eq!(round_trip(ElementType::Int8, ByteSwap::None, 2.6), 3.0);
    assert_eq!(round_trip(ElementType::Int8, ByteSwap::None, 300.0), 127.0);
    assert_eq!(round_trip(ElementType::UInt8, ByteSwap::None, -5.0), 0.0);
}

#[test]
fn test_read_end_of_stream_and_short_read() {
    let codec = ElementCodec::new(ElementType::Int32, Direction::Read, ByteSwap::None);
    let mut empty: &[u8] = &[];
    assert_eq!(codec.read(&mut empty).unwrap(), None);

    let mut short: &[u8] = &[1, 2];
    assert!(matches!(
        codec.read(&mut short),
        Err(Error::ShortRead { expected: 4, got: 2 })
    ));
}

#[test]
fn test_ascii_free_reads_across_lines() {
    let codec = ElementCodec::new(ElementType::AsciiFree, Direction::Read, ByteSwap::None);
    let mut input: &[u8] = b"1.5, 2\n\n  3e2\n";
    assert_eq!(codec.read(&mut input).unwrap(), Some(1.5));
    assert_eq!(codec.read(&mut input).unwrap(), Some(2.0));
    assert_eq!(codec.read(&mut input).unwrap(), Some(300.0));
    assert_eq!(codec.read(&mut input).unwrap(), None);
}

#[test]
fn test_ascii_token_reads_one_per_line() {
    let codec = ElementCodec::new(ElementType::AsciiToken, Direction::Read, ByteSwap::None);
    let mut input: &[u8] = b"1 99 99\n\n2,77\n";
    assert_eq!(codec.read(&mut input).unwrap(), Some(1.0));
    assert_eq!(codec.read(&mut input).unwrap(), Some(2.0));
    assert_eq!(codec.read(&mut input).unwrap(), None);
}

#[test]
fn test_ascii_encoding() {
    let codec = ElementCodec::new(ElementType::AsciiFree, Direction::Write, ByteSwap::None);
    assert_eq!(codec.encode(2.5), b"2.5 ".to_vec());
}
