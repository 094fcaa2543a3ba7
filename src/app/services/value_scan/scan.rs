//! Text to value scanning
//!
//! [`ValueScanner::scan`] converts one token under an [`Expectation`] and
//! reports which kind of value it actually decoded, so callers can check
//! geographic axes or decide between absolute and relative time.

use super::time::TimeSystem;
use crate::app::models::ColumnKind;
use crate::{Error, Result};

/// What the caller expects a token to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Float,
    /// Length with optional unit suffix and `+modifier` tail
    Dimension,
    /// Geographic coordinate of either axis
    Geographic,
    Longitude,
    Latitude,
    /// `[date]T[clock]`
    AbsTime,
    /// Relative time with optional trailing `t`, or an absolute time
    ArgTime,
    /// Decide from the token itself
    Unknown,
}

impl From<ColumnKind> for Expectation {
    fn from(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Float => Expectation::Float,
            ColumnKind::Longitude => Expectation::Longitude,
            ColumnKind::Latitude => Expectation::Latitude,
            ColumnKind::Geographic => Expectation::Geographic,
            ColumnKind::AbsTime => Expectation::AbsTime,
            ColumnKind::RelTime => Expectation::ArgTime,
            ColumnKind::Dimension => Expectation::Dimension,
        }
    }
}

/// A scanned value and the kind it was decoded as
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scanned {
    pub value: f64,
    pub kind: ColumnKind,
}

impl Scanned {
    fn new(value: f64, kind: ColumnKind) -> Self {
        Self { value, kind }
    }
}

/// Parse a floating point number, accepting Fortran `D`/`d` exponents
pub fn parse_float(text: &str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::scan(text, "empty token"));
    }
    let parsed = if text.contains(['D', 'd']) {
        text.replace(['D', 'd'], "e").parse::<f64>()
    } else {
        text.parse::<f64>()
    };
    parsed.map_err(|e| Error::scan(text, e.to_string()))
}

/// Position of a `+modifier` tail, ignoring signs that belong to a number
fn modifier_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (1..bytes.len()).find(|&i| bytes[i] == b'+' && !matches!(bytes[i - 1], b'e' | b'E' | b'd' | b'D'))
}

/// Scan a dimension such as `2.5c`, `1i`, `12p` or `3+a45`
///
/// Units convert to inches. A token that does not start like a number, or a
/// lone sign, is symbolic and scans as 0. The `+modifier` tail is ignored.
pub fn scan_dimension(text: &str) -> Result<f64> {
    let text = text.trim();
    let body = match modifier_start(text) {
        Some(pos) => &text[..pos],
        None => text,
    };
    let Some(first) = body.chars().next() else {
        return Err(Error::scan(text, "empty dimension"));
    };
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) || body == "-" || body == "+" {
        return Ok(0.0);
    }
    let (number, per_inch) = match body.as_bytes()[body.len() - 1] {
        b'c' => (&body[..body.len() - 1], 2.54),
        b'i' => (&body[..body.len() - 1], 1.0),
        b'p' => (&body[..body.len() - 1], 72.0),
        _ => (body, 1.0),
    };
    Ok(parse_float(number)? / per_inch)
}

/// Scan a geographic coordinate
///
/// A trailing `W`/`E`/`S`/`N` fixes sign and axis, `G`/`D` marks an
/// unspecified geographic value. Colons select `dd:mm` or `dd:mm:ss` parsing;
/// the sign of the degree part applies to the whole value.
pub fn scan_geo(text: &str) -> Result<Scanned> {
    let text = text.trim();
    let (body, negate, kind) = match text.chars().last() {
        Some('W' | 'w') => (&text[..text.len() - 1], true, Some(ColumnKind::Longitude)),
        Some('E' | 'e') => (&text[..text.len() - 1], false, Some(ColumnKind::Longitude)),
        Some('S' | 's') => (&text[..text.len() - 1], true, Some(ColumnKind::Latitude)),
        Some('N' | 'n') => (&text[..text.len() - 1], false, Some(ColumnKind::Latitude)),
        Some('G' | 'g' | 'D' | 'd') => (&text[..text.len() - 1], false, Some(ColumnKind::Geographic)),
        _ => (text, false, None),
    };
    if body.is_empty() {
        return Err(Error::scan(text, "missing coordinate"));
    }

    let colons = body.matches(':').count();
    let value = match colons {
        0 => {
            let bytes = body.as_bytes();
            let lone_d = bytes
                .iter()
                .enumerate()
                .any(|(i, b)| matches!(b, b'D' | b'd') && bytes.get(i + 1) != Some(&b':'));
            if lone_d {
                parse_float(&body.replace(['D', 'd'], "e"))?
            } else {
                parse_float(body)?
            }
        }
        1 | 2 => {
            let mut parts = body.split(':');
            let degrees = parts.next().unwrap_or_default();
            let negative = degrees.trim_start().starts_with('-');
            let mut value = parse_float(degrees)?.abs();
            let mut scale = 60.0;
            for part in parts {
                let sub = parse_float(part)?;
                if !(0.0..60.0).contains(&sub) {
                    return Err(Error::scan(text, "minutes or seconds outside 0-60"));
                }
                value += sub / scale;
                scale *= 60.0;
            }
            if negative { -value } else { value }
        }
        _ => return Err(Error::scan(text, "too many ':' separators")),
    };

    let kind = kind.unwrap_or(if colons > 0 {
        ColumnKind::Geographic
    } else {
        ColumnKind::Float
    });
    Ok(Scanned::new(if negate { -value } else { value }, kind))
}

/// Pick an expectation for a command-line style argument
pub fn detect_expectation(text: &str) -> Expectation {
    let text = text.trim();
    if text.contains('T') {
        return Expectation::AbsTime;
    }
    match text.chars().last() {
        Some('t') => Expectation::ArgTime,
        Some('W' | 'w' | 'E' | 'S' | 's' | 'N' | 'n' | 'G' | 'g' | 'D') => Expectation::Geographic,
        Some('c' | 'i' | 'p') => Expectation::Dimension,
        _ if text.contains(':') => Expectation::Geographic,
        _ => Expectation::Float,
    }
}

/// Scanner bound to the time system of one stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueScanner {
    pub time: TimeSystem,
}

impl ValueScanner {
    pub fn new(time: TimeSystem) -> Self {
        Self { time }
    }

    /// Scan `text` under `expectation`
    pub fn scan(&self, text: &str, expectation: Expectation) -> Result<Scanned> {
        match expectation {
            Expectation::Float => Ok(Scanned::new(parse_float(text)?, ColumnKind::Float)),
            Expectation::Dimension => Ok(Scanned::new(scan_dimension(text)?, ColumnKind::Dimension)),
            Expectation::Geographic => scan_geo(text),
            Expectation::Longitude | Expectation::Latitude => {
                let scanned = scan_geo(text)?;
                let wanted = if expectation == Expectation::Longitude {
                    ColumnKind::Longitude
                } else {
                    ColumnKind::Latitude
                };
                if scanned.kind.is_geographic() && scanned.kind != ColumnKind::Geographic && scanned.kind != wanted {
                    return Err(Error::scan(
                        text,
                        format!("expected {:?} but found {:?}", wanted, scanned.kind),
                    ));
                }
                Ok(Scanned::new(scanned.value, wanted))
            }
            Expectation::AbsTime => Ok(Scanned::new(self.time.scan_abs_time(text)?, ColumnKind::AbsTime)),
            Expectation::ArgTime => {
                if text.contains('T') {
                    return Ok(Scanned::new(self.time.scan_abs_time(text)?, ColumnKind::AbsTime));
                }
                let trimmed = text.trim();
                let number = trimmed.strip_suffix('t').unwrap_or(trimmed);
                Ok(Scanned::new(parse_float(number)?, ColumnKind::RelTime))
            }
            Expectation::Unknown => self.scan(text, detect_expectation(text)),
        }
    }

    /// Scan a data column token; NaN tokens scan as NaN for every kind
    pub fn scan_column(&self, text: &str, kind: ColumnKind) -> Result<f64> {
        if text.eq_ignore_ascii_case(crate::constants::NAN_TEXT) {
            return Ok(f64::NAN);
        }
        self.scan(text, Expectation::from(kind)).map(|s| s.value)
    }
}
