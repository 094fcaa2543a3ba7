//! Single-element codecs
//!
//! An [`ElementCodec`] reads or writes exactly one value of a fixed-width
//! type (or one ASCII token) and converts it to/from `f64`. Byte swapping,
//! when enabled, reverses the element bytes before interpretation on input
//! and after encoding on output.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::app::services::value_scan::format::format_general;
use crate::app::services::value_scan::scan::parse_float;
use crate::{Error, Result};

/// Element type selected by a one-character type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// `a`: one ASCII token per logical record (rest of line discarded)
    AsciiToken,
    /// `A`: free-form ASCII numbers read across line boundaries
    AsciiFree,
}

impl ElementType {
    /// Map a type code to an element type
    pub fn from_code(code: char) -> Result<Self> {
        Ok(match code {
            'c' => ElementType::Int8,
            'u' => ElementType::UInt8,
            'h' => ElementType::Int16,
            'H' => ElementType::UInt16,
            'i' => ElementType::Int32,
            'I' => ElementType::UInt32,
            'l' => ElementType::Int64,
            'L' => ElementType::UInt64,
            'f' => ElementType::Float32,
            'd' => ElementType::Float64,
            'a' => ElementType::AsciiToken,
            'A' => ElementType::AsciiFree,
            _ => return Err(Error::UnsupportedTypeCode { code }),
        })
    }

    pub fn code(&self) -> char {
        match self {
            ElementType::Int8 => 'c',
            ElementType::UInt8 => 'u',
            ElementType::Int16 => 'h',
            ElementType::UInt16 => 'H',
            ElementType::Int32 => 'i',
            ElementType::UInt32 => 'I',
            ElementType::Int64 => 'l',
            ElementType::UInt64 => 'L',
            ElementType::Float32 => 'f',
            ElementType::Float64 => 'd',
            ElementType::AsciiToken => 'a',
            ElementType::AsciiFree => 'A',
        }
    }

    /// Width in bytes; `None` for ASCII elements
    pub fn width(&self) -> Option<usize> {
        match self {
            ElementType::Int8 | ElementType::UInt8 => Some(1),
            ElementType::Int16 | ElementType::UInt16 => Some(2),
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => Some(4),
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => Some(8),
            ElementType::AsciiToken | ElementType::AsciiFree => None,
        }
    }

    pub fn is_ascii(&self) -> bool {
        self.width().is_none()
    }
}

/// Direction in which a codec is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Which directions swap bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteSwap {
    #[default]
    None,
    Input,
    Output,
    Both,
}

impl ByteSwap {
    /// Whether swapping applies in `direction`
    pub fn applies(&self, direction: Direction) -> bool {
        match (self, direction) {
            (ByteSwap::Both, _) => true,
            (ByteSwap::Input, Direction::Read) => true,
            (ByteSwap::Output, Direction::Write) => true,
            _ => false,
        }
    }
}

/// Codec for one element type with a fixed swap setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementCodec {
    pub element: ElementType,
    pub swap: bool,
}

/// Fill `buf` from `reader`, returning how many bytes arrived before EOF
pub(crate) fn read_full(reader: &mut dyn BufRead, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io("Binary read failed", e)),
        }
    }
    Ok(filled)
}

macro_rules! decode {
    ($ty:ty, $bytes:expr) => {{
        let mut raw = [0u8; std::mem::size_of::<$ty>()];
        raw.copy_from_slice($bytes);
        <$ty>::from_ne_bytes(raw) as f64
    }};
}

impl ElementCodec {
    /// Codec for `element` in `direction` with the given swap setting
    pub fn new(element: ElementType, direction: Direction, swap: ByteSwap) -> Self {
        Self {
            element,
            swap: swap.applies(direction) && !element.is_ascii(),
        }
    }

    /// Read one element
    ///
    /// Returns `Ok(None)` at a clean end of stream and
    /// [`Error::ShortRead`] when the stream ends inside an element.
    pub fn read(&self, reader: &mut dyn BufRead) -> Result<Option<f64>> {
        let Some(width) = self.element.width() else {
            return match self.element {
                ElementType::AsciiToken => read_line_token(reader),
                _ => read_free_token(reader),
            };
        };
        let mut buf = [0u8; 8];
        let got = read_full(reader, &mut buf[..width])?;
        if got == 0 {
            return Ok(None);
        }
        if got < width {
            return Err(Error::ShortRead {
                expected: width,
                got,
            });
        }
        Ok(Some(self.decode(&mut buf[..width])))
    }

    /// Decode a buffer holding exactly one element, swapping in place
    pub fn decode(&self, bytes: &mut [u8]) -> f64 {
        if self.swap {
            bytes.reverse();
        }
        match self.element {
            ElementType::Int8 => decode!(i8, bytes),
            ElementType::UInt8 => decode!(u8, bytes),
            ElementType::Int16 => decode!(i16, bytes),
            ElementType::UInt16 => decode!(u16, bytes),
            ElementType::Int32 => decode!(i32, bytes),
            ElementType::UInt32 => decode!(u32, bytes),
            ElementType::Int64 => decode!(i64, bytes),
            ElementType::UInt64 => decode!(u64, bytes),
            ElementType::Float32 => decode!(f32, bytes),
            ElementType::Float64 => decode!(f64, bytes),
            ElementType::AsciiToken | ElementType::AsciiFree => f64::NAN,
        }
    }

    /// Encode one value into its byte representation
    ///
    /// Integer targets round to nearest and saturate; NaN becomes 0.
    pub fn encode(&self, value: f64) -> Vec<u8> {
        let mut bytes = match self.element {
            ElementType::Int8 => (value.round() as i8).to_ne_bytes().to_vec(),
            ElementType::UInt8 => (value.round() as u8).to_ne_bytes().to_vec(),
            ElementType::Int16 => (value.round() as i16).to_ne_bytes().to_vec(),
            ElementType::UInt16 => (value.round() as u16).to_ne_bytes().to_vec(),
            ElementType::Int32 => (value.round() as i32).to_ne_bytes().to_vec(),
            ElementType::UInt32 => (value.round() as u32).to_ne_bytes().to_vec(),
            ElementType::Int64 => (value.round() as i64).to_ne_bytes().to_vec(),
            ElementType::UInt64 => (value.round() as u64).to_ne_bytes().to_vec(),
            ElementType::Float32 => (value as f32).to_ne_bytes().to_vec(),
            ElementType::Float64 => value.to_ne_bytes().to_vec(),
            ElementType::AsciiToken | ElementType::AsciiFree => {
                return format!("{} ", format_general(value, 12)).into_bytes();
            }
        };
        if self.swap {
            bytes.reverse();
        }
        bytes
    }

    /// Write one element
    pub fn write(&self, writer: &mut dyn Write, value: f64) -> Result<()> {
        writer
            .write_all(&self.encode(value))
            .map_err(|e| Error::write_failure("Binary element write failed", e))
    }
}

fn is_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b','
}

/// Read the next whitespace/comma delimited token, crossing line ends
fn read_free_token(reader: &mut dyn BufRead) -> Result<Option<f64>> {
    let mut token = Vec::new();
    loop {
        let buf = reader
            .fill_buf()
            .map_err(|e| Error::io("ASCII read failed", e))?;
        if buf.is_empty() {
            break;
        }
        let mut used = 0;
        let mut done = false;
        for &b in buf {
            used += 1;
            if is_separator(b) {
                if !token.is_empty() {
                    done = true;
                    break;
                }
            } else {
                token.push(b);
            }
        }
        reader.consume(used);
        if done {
            break;
        }
    }
    if token.is_empty() {
        return Ok(None);
    }
    let text = String::from_utf8_lossy(&token);
    Ok(Some(parse_float(&text).unwrap_or(f64::NAN)))
}

/// Read one line and decode its first token
fn read_line_token(reader: &mut dyn BufRead) -> Result<Option<f64>> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .map_err(|e| Error::io("ASCII read failed", e))?;
        if n == 0 {
            return Ok(None);
        }
        if let Some(token) = line.split(|c: char| c.is_whitespace() || c == ',').find(|t| !t.is_empty()) {
            return Ok(Some(parse_float(token).unwrap_or(f64::NAN)));
        }
    }
}
