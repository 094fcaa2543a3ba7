//! Tests for the binary codec layer

use super::element::{ByteSwap, Direction, ElementCodec, ElementType};

mod element_tests;
mod grid_format_tests;
mod record_format_tests;

/// Every fixed-width element type
pub const FIXED_TYPES: [ElementType; 10] = [
    ElementType::Int8,
    ElementType::UInt8,
    ElementType::Int16,
    ElementType::UInt16,
    ElementType::Int32,
    ElementType::UInt32,
    ElementType::Int64,
    ElementType::UInt64,
    ElementType::Float32,
    ElementType::Float64,
];

/// Encode with one codec and decode with its read counterpart
pub fn round_trip(element: ElementType, swap: ByteSwap, value: f64) -> f64 {
    let writer = ElementCodec::new(element, Direction::Write, swap);
    let reader = ElementCodec::new(element, Direction::Read, swap);
    let mut bytes = writer.encode(value);
    reader.decode(&mut bytes)
}
