//! Calendar and clock handling
//!
//! Absolute times are held internally as a relative value: time elapsed since
//! a configurable epoch, measured in a configurable unit. [`TimeSystem`]
//! converts between that representation and calendar date plus seconds of
//! day, and scans ISO-style `date T clock` strings.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_Y2K_OFFSET_YEAR, MAX_CLOCK_SECONDS, SECONDS_PER_DAY};
use crate::{Error, Result};

/// Unit of relative time values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "m")]
    Minute,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "d")]
    Day,
}

impl TimeUnit {
    /// Length of one unit in seconds
    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Second => 1.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Hour => 3600.0,
            TimeUnit::Day => SECONDS_PER_DAY,
        }
    }
}

/// Epoch, unit and two-digit-year window of one stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSystem {
    epoch: NaiveDateTime,
    unit: TimeUnit,
    y2k_offset_year: i32,
}

impl Default for TimeSystem {
    fn default() -> Self {
        Self {
            epoch: NaiveDateTime::default(),
            unit: TimeUnit::Second,
            y2k_offset_year: DEFAULT_Y2K_OFFSET_YEAR,
        }
    }
}

impl TimeSystem {
    pub fn new(epoch: NaiveDateTime, unit: TimeUnit, y2k_offset_year: i32) -> Self {
        Self {
            epoch,
            unit,
            y2k_offset_year,
        }
    }

    /// Build from an epoch string such as `1970-01-01T00:00:00` or `2000-01-01`
    pub fn from_epoch_str(epoch: &str, unit: TimeUnit, y2k_offset_year: i32) -> Result<Self> {
        let epoch = parse_epoch(epoch)?;
        Ok(Self::new(epoch, unit, y2k_offset_year))
    }

    pub fn epoch(&self) -> NaiveDateTime {
        self.epoch
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Expand a two-digit year into the hundred-year window starting at the
    /// configured offset year
    pub fn expand_year(&self, two_digit: i32) -> i32 {
        let century = self.y2k_offset_year.div_euclid(100) * 100;
        let year = century + two_digit;
        if year < self.y2k_offset_year { year + 100 } else { year }
    }

    /// Relative time of a calendar date plus seconds of day
    pub fn to_relative(&self, date: NaiveDate, seconds_of_day: f64) -> f64 {
        let days = (date - self.epoch.date()).num_days() as f64;
        let epoch_seconds = self.epoch.time().num_seconds_from_midnight() as f64;
        (days * SECONDS_PER_DAY + seconds_of_day - epoch_seconds) / self.unit.seconds()
    }

    /// Calendar date and seconds of day of a relative time
    pub fn to_calendar(&self, value: f64) -> Option<(NaiveDate, f64)> {
        if !value.is_finite() {
            return None;
        }
        let seconds =
            value * self.unit.seconds() + self.epoch.time().num_seconds_from_midnight() as f64;
        let days = (seconds / SECONDS_PER_DAY).floor();
        let seconds_of_day = seconds - days * SECONDS_PER_DAY;
        let date = self
            .epoch
            .date()
            .checked_add_signed(Duration::try_days(days as i64)?)?;
        Some((date, seconds_of_day))
    }

    /// Scan `[date]T[clock]` into a relative time
    ///
    /// Either side may be empty but the `T` is required. An empty date means
    /// the epoch's date; an empty clock means midnight.
    pub fn scan_abs_time(&self, text: &str) -> Result<f64> {
        let text = text.trim();
        let Some((date_part, clock_part)) = text.split_once('T') else {
            return Err(Error::scan(text, "absolute time needs a 'T' separator"));
        };
        let date = if date_part.is_empty() {
            self.epoch.date()
        } else {
            self.scan_calendar(date_part)?
        };
        let seconds = if clock_part.is_empty() {
            0.0
        } else {
            scan_clock(clock_part)?
        };
        Ok(self.to_relative(date, seconds))
    }

    /// Scan a calendar date
    ///
    /// Accepts `yyyy[-mm[-dd]]`, `yyyy-jjj` (day of year) and
    /// `yyyy-Www[-d]` (ISO week). A two-digit year is expanded by
    /// [`TimeSystem::expand_year`].
    pub fn scan_calendar(&self, text: &str) -> Result<NaiveDate> {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        if let Some(w) = body.find('W') {
            let year = self.scan_year(body[..w].trim_end_matches('-'), negative, text)?;
            let rest = &body[w + 1..];
            let (week, day) = match rest.split_once('-') {
                Some((week, day)) => (week, day),
                None if rest.len() > 2 => (&rest[..2], &rest[2..]),
                None => (rest, "1"),
            };
            let week = scan_int(week, text)?;
            let day = scan_int(day, text)?;
            if !(1..=53).contains(&week) {
                return Err(Error::scan(text, format!("ISO week {} outside 1-53", week)));
            }
            let weekday = iso_weekday(day)
                .ok_or_else(|| Error::scan(text, format!("ISO weekday {} outside 1-7", day)))?;
            return NaiveDate::from_isoywd_opt(year, week as u32, weekday)
                .ok_or_else(|| Error::scan(text, format!("year {} has no ISO week {}", year, week)));
        }

        let parts: Vec<&str> = body.split('-').collect();
        let year = self.scan_year(parts[0], negative, text)?;
        match parts.as_slice() {
            [_] => NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| Error::scan(text, "year out of range")),
            [_, doy] if doy.len() == 3 => {
                let doy = scan_int(doy, text)?;
                NaiveDate::from_yo_opt(year, doy as u32)
                    .ok_or_else(|| Error::scan(text, format!("day of year {} out of range", doy)))
            }
            [_, month] => {
                let month = checked_month(scan_int(month, text)?, text)?;
                NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| Error::scan(text, "year out of range"))
            }
            [_, month, day] => {
                let month = checked_month(scan_int(month, text)?, text)?;
                let day = scan_int(day, text)?;
                NaiveDate::from_ymd_opt(year, month, day as u32).ok_or_else(|| {
                    Error::scan(text, format!("day {} out of range for month {}", day, month))
                })
            }
            _ => Err(Error::scan(text, "too many date fields")),
        }
    }

    fn scan_year(&self, token: &str, negative: bool, text: &str) -> Result<i32> {
        let year = scan_int(token, text)?;
        if token.len() == 2 && !negative {
            return Ok(self.expand_year(year));
        }
        Ok(if negative { -year } else { year })
    }
}

fn parse_epoch(epoch: &str) -> Result<NaiveDateTime> {
    let epoch = epoch.trim();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(epoch, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(datetime);
    }
    NaiveDate::parse_from_str(epoch.trim_end_matches('T'), "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|e| Error::configuration(format!("Invalid time epoch '{}': {}", epoch, e)))
}

fn scan_int(token: &str, text: &str) -> Result<i32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::scan(text, format!("'{}' is not an unsigned integer", token)));
    }
    token
        .parse()
        .map_err(|_| Error::scan(text, format!("'{}' is too large", token)))
}

fn checked_month(month: i32, text: &str) -> Result<u32> {
    if !(1..=12).contains(&month) {
        return Err(Error::scan(text, format!("month {} outside 1-12", month)));
    }
    Ok(month as u32)
}

fn iso_weekday(day: i32) -> Option<Weekday> {
    Some(match day {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => return None,
    })
}

/// Scan a clock string into seconds of day
///
/// Accepts `hh[:mm[:ss[.frac]]]` on a 24-hour clock (a leap second is
/// tolerated) or on a 12-hour clock when followed by `am`/`pm`, `a`/`p` or
/// `a.m.`/`p.m.` in any case.
pub fn scan_clock(text: &str) -> Result<f64> {
    let lower = text.trim().to_ascii_lowercase();
    let (body, meridiem) = strip_meridiem(&lower);
    let parts: Vec<&str> = body.trim_end().split(':').collect();
    if parts.len() > 3 || parts[0].is_empty() {
        return Err(Error::scan(text, "clock must be hh[:mm[:ss]]"));
    }

    let mut hour = scan_int(parts[0], text)?;
    let minute = match parts.get(1) {
        Some(m) => scan_int(m, text)?,
        None => 0,
    };
    let second = match parts.get(2) {
        Some(s) => super::scan::parse_float(s)?,
        None => 0.0,
    };
    if minute >= 60 || !(0.0..61.0).contains(&second) {
        return Err(Error::scan(text, "minutes or seconds out of range"));
    }
    if let Some(pm) = meridiem {
        if !(1..=12).contains(&hour) {
            return Err(Error::scan(text, "12-hour clock needs an hour in 1-12"));
        }
        hour = hour % 12 + if pm { 12 } else { 0 };
    }

    let seconds = hour as f64 * 3600.0 + minute as f64 * 60.0 + second;
    if seconds >= MAX_CLOCK_SECONDS {
        return Err(Error::scan(text, "clock beyond the end of the day"));
    }
    Ok(seconds)
}

fn strip_meridiem(text: &str) -> (&str, Option<bool>) {
    const MARKERS: [(&str, bool); 6] = [
        ("a.m.", false),
        ("p.m.", true),
        ("am", false),
        ("pm", true),
        ("a", false),
        ("p", true),
    ];
    for (marker, pm) in MARKERS {
        if let Some(body) = text.strip_suffix(marker) {
            return (body, Some(pm));
        }
    }
    (text, None)
}

/// Day of week 1 (Monday) to 7 (Sunday) and ISO week data of a date
pub(crate) fn iso_parts(date: NaiveDate) -> (i32, u32, u32) {
    let week = date.iso_week();
    (week.year(), week.week(), date.weekday().number_from_monday())
}
