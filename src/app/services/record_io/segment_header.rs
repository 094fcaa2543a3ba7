//! Inline directives carried in segment header text
//!
//! A header such as `> -W1p,red -G- -Z12.5 -L"Line A" -Ph` carries style
//! and metadata options for its segment. Unrecognised words are ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::app::models::PolygonRole;
use crate::app::services::value_scan::parse_float;
use crate::constants::NAN_TEXT;

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([GWZLDP])(.*)$").expect("directive regex is valid"));

/// Fill or pen setting of a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSetting {
    /// Bare option: fall back to the default style
    Default,
    /// `-` argument: switched off
    Off,
    Set(String),
}

impl StyleSetting {
    fn from_argument(argument: &str) -> Self {
        match argument {
            "" => StyleSetting::Default,
            "-" => StyleSetting::Off,
            other => StyleSetting::Set(other.to_string()),
        }
    }
}

/// Directives found in one segment header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentDirectives {
    pub fill: Option<StyleSetting>,
    pub pen: Option<StyleSetting>,
    /// Value for palette lookup, NaN when given as `NaN`
    pub z: Option<f64>,
    pub label: Option<String>,
    pub distance: Option<f64>,
    pub role: Option<PolygonRole>,
}

/// Split on whitespace outside of quotes, keeping the quotes
fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut quote: Option<char> = None;
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                start.get_or_insert(i);
            }
            None if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    words.push(&text[s..i]);
                }
            }
            None => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }
    words
}

fn unquote(text: &str) -> String {
    text.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

fn scan_z(text: &str) -> Option<f64> {
    if text.eq_ignore_ascii_case(NAN_TEXT) {
        return Some(f64::NAN);
    }
    parse_float(text).ok()
}

impl SegmentDirectives {
    /// Parse the directives of a header (text after the segment marker)
    pub fn parse(header: &str) -> Self {
        let mut directives = SegmentDirectives::default();
        let words = split_words(header);
        let mut i = 0;
        while i < words.len() {
            let word = words[i];
            i += 1;
            let Some(caps) = DIRECTIVE.captures(word) else {
                continue;
            };
            let argument = caps.get(2).map_or("", |m| m.as_str());
            match &caps[1] {
                "G" => directives.fill = Some(StyleSetting::from_argument(argument)),
                "W" => directives.pen = Some(StyleSetting::from_argument(argument)),
                "Z" => {
                    if argument.is_empty() {
                        if let Some(z) = words.get(i).and_then(|next| scan_z(next)) {
                            directives.z = Some(z);
                            i += 1;
                        }
                    } else {
                        directives.z = scan_z(argument);
                    }
                }
                "L" => directives.label = Some(unquote(argument)),
                "D" => directives.distance = parse_float(argument).ok(),
                "P" => {
                    directives.role = match argument {
                        "" => Some(PolygonRole::Perimeter),
                        "h" | "H" => Some(PolygonRole::Hole),
                        _ => None,
                    }
                }
                _ => {}
            }
        }
        directives
    }

    pub fn is_empty(&self) -> bool {
        *self == SegmentDirectives::default()
    }
}
