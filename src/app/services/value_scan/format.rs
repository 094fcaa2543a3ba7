//! Value to text formatting
//!
//! Templates are parsed once from their description strings and then applied
//! to every value. [`ValueFormatter`] bundles the float, geographic, date and
//! clock templates of one output stream and dispatches on column kind.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::time::{TimeSystem, iso_parts};
use crate::app::models::ColumnKind;
use crate::constants::{MAX_TEMPLATE_DECIMALS, NAN_TEXT};
use crate::{Error, Result};

static FLOAT_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%(-)?(\d+)?(?:\.(\d+))?l?([eEfFgG])$").expect("float template pattern is valid")
});

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn split_exponent(text: &str) -> (&str, i32) {
    match text.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (text, 0),
    }
}

fn c_exponent(mantissa: &str, exp: i32, upper: bool) -> String {
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}{}{}{:02}", mantissa, e, sign, exp.abs())
}

fn non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some(NAN_TEXT.to_string())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" }.to_string())
    } else {
        None
    }
}

/// Format like C's `%.<precision>g`
pub fn format_general(value: f64, precision: usize) -> String {
    if let Some(text) = non_finite(value) {
        return text;
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = split_exponent(&scientific);
    if exp < -4 || exp >= precision as i32 {
        c_exponent(trim_fraction(mantissa), exp, false)
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// A printf-style float template such as `%.12g`, `%10.4f` or `%lg`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatTemplate {
    conversion: char,
    precision: usize,
    width: usize,
    left_align: bool,
}

impl Default for FloatTemplate {
    fn default() -> Self {
        Self {
            conversion: 'g',
            precision: 12,
            width: 0,
            left_align: false,
        }
    }
}

impl FloatTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let caps = FLOAT_TEMPLATE
            .captures(template.trim())
            .ok_or_else(|| Error::invalid_format(template, "expected a %[width][.precision]{e,f,g} template"))?;
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<usize>().ok());
        let conversion = caps.get(4).map_or('g', |m| m.as_str().chars().next().unwrap_or('g'));
        Ok(Self {
            conversion,
            precision: number(3).unwrap_or(6),
            width: number(2).unwrap_or(0),
            left_align: caps.get(1).is_some(),
        })
    }

    /// Decimal digits after the point for `f` conversions
    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn format(&self, value: f64) -> String {
        let text = non_finite(value).unwrap_or_else(|| match self.conversion {
            'f' | 'F' => format!("{:.*}", self.precision, value),
            'e' | 'E' => {
                let scientific = format!("{:.*e}", self.precision, value);
                let (mantissa, exp) = split_exponent(&scientific);
                c_exponent(mantissa, exp, self.conversion == 'E')
            }
            'G' => format_general(value, self.precision).to_uppercase(),
            _ => format_general(value, self.precision),
        });
        if self.left_align {
            format!("{:<width$}", text, width = self.width)
        } else {
            format!("{:>width$}", text, width = self.width)
        }
    }
}

/// Range used when writing longitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoRange {
    /// -180 to 180
    #[default]
    Signed,
    /// 0 to 360
    Positive,
    /// -360 to 0
    Negative,
}

impl GeoRange {
    fn adjust(&self, lon: f64) -> f64 {
        match self {
            GeoRange::Signed => {
                let x = lon.rem_euclid(360.0);
                if x > 180.0 { x - 360.0 } else { x }
            }
            GeoRange::Positive => lon.rem_euclid(360.0),
            GeoRange::Negative => {
                let x = lon.rem_euclid(360.0);
                if x > 0.0 { x - 360.0 } else { x }
            }
        }
    }
}

/// Hemisphere letter placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hemisphere {
    /// Signed numbers, no letter
    #[default]
    None,
    /// Letter appended directly (`F`)
    Attached,
    /// Letter appended after a space (`G`)
    Spaced,
}

/// Number of decimals requested by the `x` run after a template's `.`
fn template_decimals(template: &str, fraction: &str) -> Result<usize> {
    if !fraction.chars().all(|c| c == 'x') {
        return Err(Error::invalid_format(template, "fraction must be written as x's"));
    }
    if fraction.len() > MAX_TEMPLATE_DECIMALS {
        return Err(Error::invalid_format(
            template,
            format!("at most {} decimals are supported", MAX_TEMPLATE_DECIMALS),
        ));
    }
    Ok(fraction.len())
}

/// Geographic output template
///
/// `D` writes decimal degrees through the float template, `+D` and `-D` pick
/// the 0/360 and -360/0 ranges. `ddd[:mm[:ss]][.xxx]` writes degrees,
/// minutes and seconds with as many decimals as there are `x`. A trailing
/// `F` or `G` replaces the sign with a hemisphere letter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeoFormat {
    /// 1 = degrees, 2 = degrees and minutes, 3 = degrees, minutes, seconds;
    /// 0 = decimal through the float template
    items: usize,
    decimals: usize,
    separator: String,
    range: GeoRange,
    hemisphere: Hemisphere,
}

impl GeoFormat {
    pub fn parse(template: &str) -> Result<Self> {
        let mut body = template.trim();
        let mut format = GeoFormat {
            separator: ":".to_string(),
            ..Default::default()
        };
        if let Some(rest) = body.strip_prefix('+') {
            format.range = GeoRange::Positive;
            body = rest;
        } else if let Some(rest) = body.strip_prefix('-') {
            format.range = GeoRange::Negative;
            body = rest;
        }
        if let Some(rest) = body.strip_suffix('F') {
            format.hemisphere = Hemisphere::Attached;
            body = rest;
        } else if let Some(rest) = body.strip_suffix('G') {
            format.hemisphere = Hemisphere::Spaced;
            body = rest;
        }
        if body == "D" {
            return Ok(format);
        }

        let (dms, fraction) = match body.split_once('.') {
            Some((dms, fraction)) => (dms, fraction),
            None => (body, ""),
        };
        format.decimals = template_decimals(template, fraction)?;

        let Some(rest) = dms.strip_prefix("ddd") else {
            return Err(Error::invalid_format(template, "expected D or ddd[:mm[:ss]]"));
        };
        format.items = 1;
        let mut rest = rest;
        for unit in ["mm", "ss"] {
            if rest.is_empty() {
                break;
            }
            let Some(pos) = rest.find(unit) else {
                return Err(Error::invalid_format(template, format!("expected '{}'", unit)));
            };
            let separator = &rest[..pos];
            if format.items == 1 {
                format.separator = separator.to_string();
            } else if separator != format.separator {
                return Err(Error::invalid_format(template, "separators must match"));
            }
            rest = &rest[pos + unit.len()..];
            format.items += 1;
        }
        if !rest.is_empty() {
            return Err(Error::invalid_format(template, format!("unexpected '{}'", rest)));
        }
        Ok(format)
    }

    /// Whether values print as decimal degrees
    pub fn is_decimal(&self) -> bool {
        self.items == 0
    }

    /// Format a coordinate; `is_lat` selects N/S over E/W
    pub fn format(&self, value: f64, is_lat: bool, float: &FloatTemplate) -> String {
        self.render(value, Some(is_lat), float)
    }

    /// Format a coordinate whose axis is unknown
    ///
    /// No longitude range is applied and no hemisphere letter is written;
    /// the sign is kept.
    pub fn format_unknown_axis(&self, value: f64, float: &FloatTemplate) -> String {
        self.render(value, None, float)
    }

    fn render(&self, value: f64, is_lat: Option<bool>, float: &FloatTemplate) -> String {
        if let Some(text) = non_finite(value) {
            return text;
        }
        let value = match is_lat {
            Some(false) => self.range.adjust(value),
            _ => value,
        };
        let letter = match (is_lat, value.partial_cmp(&0.0)) {
            (None, _) | (_, Some(std::cmp::Ordering::Equal)) | (_, None) => None,
            (Some(true), Some(std::cmp::Ordering::Less)) => Some('S'),
            (Some(true), _) => Some('N'),
            (Some(false), Some(std::cmp::Ordering::Less)) => Some('W'),
            (Some(false), _) => Some('E'),
        };
        let magnitude = if self.hemisphere == Hemisphere::None || is_lat.is_none() {
            value
        } else {
            value.abs()
        };

        let mut text = if self.items == 0 {
            float.format(magnitude)
        } else {
            self.format_dms(magnitude)
        };
        match (self.hemisphere, letter) {
            (Hemisphere::Attached, Some(l)) => text.push(l),
            (Hemisphere::Spaced, Some(l)) => {
                text.push(' ');
                text.push(l);
            }
            _ => {}
        }
        text
    }

    fn format_dms(&self, value: f64) -> String {
        let scale = 10_i64.pow(self.decimals as u32);
        let per_item = [1_i64, 60, 3600];
        let units_per_degree = per_item[self.items - 1] * scale;
        let total = (value.abs() * units_per_degree as f64).round() as i64;

        let mut text = String::new();
        if value < 0.0 && total > 0 {
            text.push('-');
        }
        let mut remaining = total;
        let mut divisor = units_per_degree;
        for item in 0..self.items {
            let whole = remaining / divisor;
            remaining %= divisor;
            if item == 0 {
                text.push_str(&whole.to_string());
            } else {
                text.push_str(&self.separator);
                text.push_str(&format!("{:02}", whole));
            }
            divisor /= 60;
        }
        if self.decimals > 0 {
            text.push_str(&format!(".{:0width$}", remaining, width = self.decimals));
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DatePart {
    Year(usize),
    IsoYear(usize),
    Month,
    Day,
    DayOfYear,
    IsoWeek,
    IsoWeekday,
    Literal(String),
}

/// Calendar output template such as `yyyy-mm-dd`, `yyyy-jjj` or `yyyy-Www-d`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTemplate {
    parts: Vec<DatePart>,
}

impl Default for DateTemplate {
    fn default() -> Self {
        Self {
            parts: vec![
                DatePart::Year(4),
                DatePart::Literal("-".to_string()),
                DatePart::Month,
                DatePart::Literal("-".to_string()),
                DatePart::Day,
            ],
        }
    }
}

impl DateTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let iso = template.contains('W');
        let chars: Vec<char> = template.chars().collect();
        let mut parts = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            let part = match (c, run) {
                ('y', 2 | 4) if iso => DatePart::IsoYear(run),
                ('y', 2 | 4) => DatePart::Year(run),
                ('m', 2) => DatePart::Month,
                ('d', 2) if !iso => DatePart::Day,
                ('d', 1) if iso => DatePart::IsoWeekday,
                ('j', 3) => DatePart::DayOfYear,
                ('w', 2) if iso => DatePart::IsoWeek,
                ('y' | 'm' | 'd' | 'j' | 'w', _) => {
                    return Err(Error::invalid_format(
                        template,
                        format!("unexpected run of {} '{}'", run, c),
                    ));
                }
                _ => {
                    match parts.last_mut() {
                        Some(DatePart::Literal(text)) => text.push(c),
                        _ => parts.push(DatePart::Literal(c.to_string())),
                    }
                    i += 1;
                    continue;
                }
            };
            parts.push(part);
            i += run;
        }
        if !parts.iter().any(|p| !matches!(p, DatePart::Literal(_))) {
            return Err(Error::invalid_format(template, "no date fields"));
        }
        Ok(Self { parts })
    }

    pub fn format(&self, date: NaiveDate) -> String {
        let (iso_year, iso_week, iso_weekday) = iso_parts(date);
        let year_text = |year: i32, width: usize| {
            if width == 2 {
                format!("{:02}", year.rem_euclid(100))
            } else {
                format!("{:04}", year)
            }
        };
        self.parts
            .iter()
            .map(|part| match part {
                DatePart::Year(w) => year_text(date.year(), *w),
                DatePart::IsoYear(w) => year_text(iso_year, *w),
                DatePart::Month => format!("{:02}", date.month()),
                DatePart::Day => format!("{:02}", date.day()),
                DatePart::DayOfYear => format!("{:03}", date.ordinal()),
                DatePart::IsoWeek => format!("{:02}", iso_week),
                DatePart::IsoWeekday => iso_weekday.to_string(),
                DatePart::Literal(text) => text.clone(),
            })
            .collect()
    }
}

/// Clock output template such as `hh:mm:ss`, `hh:mm:ss.xxx` or `hh:mma`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockTemplate {
    items: usize,
    decimals: usize,
    separator: String,
    /// `Some(uppercase)` for a 12-hour clock with an am/pm suffix
    meridiem: Option<bool>,
}

impl Default for ClockTemplate {
    fn default() -> Self {
        Self {
            items: 3,
            decimals: 0,
            separator: ":".to_string(),
            meridiem: None,
        }
    }
}

impl ClockTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut body = template.trim();
        let mut meridiem = None;
        if let Some(rest) = body.strip_suffix('a') {
            meridiem = Some(false);
            body = rest;
        } else if let Some(rest) = body.strip_suffix('A') {
            meridiem = Some(true);
            body = rest;
        }
        let (hms, fraction) = body.split_once('.').unwrap_or((body, ""));
        let decimals = template_decimals(template, fraction)?;
        let Some(mut rest) = hms.strip_prefix("hh") else {
            return Err(Error::invalid_format(template, "expected hh[:mm[:ss]]"));
        };
        let mut items = 1;
        let mut separator = ":".to_string();
        for unit in ["mm", "ss"] {
            if rest.is_empty() {
                break;
            }
            let Some(pos) = rest.find(unit) else {
                return Err(Error::invalid_format(template, format!("expected '{}'", unit)));
            };
            if items == 1 {
                separator = rest[..pos].to_string();
            }
            rest = &rest[pos + unit.len()..];
            items += 1;
        }
        if !rest.is_empty() {
            return Err(Error::invalid_format(template, format!("unexpected '{}'", rest)));
        }
        Ok(Self {
            items,
            decimals,
            separator,
            meridiem,
        })
    }

    /// Smallest step representable by this template, in seconds
    pub fn resolution(&self) -> f64 {
        let unit = match self.items {
            1 => 3600.0,
            2 => 60.0,
            _ => 1.0,
        };
        unit / 10f64.powi(self.decimals as i32)
    }

    /// Format seconds of day, already rounded to [`ClockTemplate::resolution`]
    pub fn format(&self, seconds_of_day: f64) -> String {
        let scale = 10_i64.pow(self.decimals as u32);
        let per_item = [3600_i64, 60, 1];
        let total = (seconds_of_day / self.resolution()).round() as i64;
        let mut remaining = total;
        let mut values = Vec::with_capacity(self.items);
        for unit in per_item.iter().take(self.items) {
            let divisor = unit / per_item[self.items - 1] * scale;
            let whole = remaining / divisor;
            remaining %= divisor;
            values.push(whole);
        }

        let mut hour = values[0];
        let suffix = self.meridiem.map(|upper| {
            let pm = hour >= 12;
            hour = match hour % 12 {
                0 => 12,
                h => h,
            };
            match (pm, upper) {
                (false, false) => "am",
                (true, false) => "pm",
                (false, true) => "AM",
                (true, true) => "PM",
            }
        });

        let mut text = format!("{:02}", hour);
        for value in &values[1..] {
            text.push_str(&self.separator);
            text.push_str(&format!("{:02}", value));
        }
        if self.decimals > 0 {
            text.push_str(&format!(".{:0width$}", remaining, width = self.decimals));
        }
        if let Some(suffix) = suffix {
            text.push_str(suffix);
        }
        text
    }
}

/// All output templates of one stream
#[derive(Debug, Clone, Default)]
pub struct ValueFormatter {
    pub float: FloatTemplate,
    pub geo: GeoFormat,
    pub date: DateTemplate,
    pub clock: ClockTemplate,
    pub time: TimeSystem,
}

impl ValueFormatter {
    /// Build from template strings
    pub fn from_templates(
        float: &str,
        geo: &str,
        date: &str,
        clock: &str,
        time: TimeSystem,
    ) -> Result<Self> {
        Ok(Self {
            float: FloatTemplate::parse(float)?,
            geo: GeoFormat::parse(geo)?,
            date: DateTemplate::parse(date)?,
            clock: ClockTemplate::parse(clock)?,
            time,
        })
    }

    /// Format an absolute time as `<date>T<clock>`
    pub fn format_abs_time(&self, value: f64) -> String {
        let resolution = self.clock.resolution() / self.time.unit().seconds();
        let rounded = (value / resolution).round() * resolution;
        match self.time.to_calendar(rounded) {
            Some((date, seconds)) => {
                format!("{}T{}", self.date.format(date), self.clock.format(seconds))
            }
            None => NAN_TEXT.to_string(),
        }
    }

    /// Format one value according to its column kind
    pub fn format_value(&self, value: f64, kind: ColumnKind) -> String {
        if value.is_nan() {
            return NAN_TEXT.to_string();
        }
        match kind {
            ColumnKind::Longitude => self.geo.format(value, false, &self.float),
            ColumnKind::Geographic => self.geo.format_unknown_axis(value, &self.float),
            ColumnKind::Latitude => self.geo.format(value, true, &self.float),
            ColumnKind::AbsTime => self.format_abs_time(value),
            ColumnKind::Float | ColumnKind::RelTime | ColumnKind::Dimension => self.float.format(value),
        }
    }
}
