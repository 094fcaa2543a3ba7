//! Gap detection between consecutive records
//!
//! A gap is a discontinuity large enough to be treated as an implicit
//! segment break. Up to several criteria can be combined; the detector
//! reports a gap when any (or all) of them fire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_KM;
use crate::{Error, Result};

/// What a gap criterion measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapMetric {
    /// Change in one column
    Column(usize),
    /// Change in the first column
    X,
    /// Change in the second column
    Y,
    /// Cartesian distance in the first two columns
    Distance,
    /// Great-circle distance in km, first two columns as lon/lat degrees
    GreatCircle,
}

/// Direction of change a criterion reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSign {
    #[default]
    Either,
    /// Only increases larger than the threshold
    Increase,
    /// Only decreases larger than the threshold
    Decrease,
}

/// How several criteria combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapLogic {
    /// Any criterion firing is a gap
    #[default]
    Any,
    /// Every criterion must fire
    All,
}

/// One gap criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapCriterion {
    pub metric: GapMetric,
    pub threshold: f64,
    #[serde(default)]
    pub sign: GapSign,
}

fn great_circle_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

impl GapCriterion {
    pub fn new(metric: GapMetric, threshold: f64) -> Self {
        Self {
            metric,
            threshold,
            sign: GapSign::Either,
        }
    }

    pub fn with_sign(mut self, sign: GapSign) -> Self {
        self.sign = sign;
        self
    }

    /// Highest column index this criterion reads
    pub fn max_column(&self) -> usize {
        match self.metric {
            GapMetric::Column(col) => col,
            GapMetric::X => 0,
            GapMetric::Y | GapMetric::Distance | GapMetric::GreatCircle => 1,
        }
    }

    /// Whether the step from `previous` to `current` exceeds the threshold
    ///
    /// Missing or NaN values never produce a gap.
    pub fn is_gap(&self, previous: &[f64], current: &[f64]) -> bool {
        let at = |record: &[f64], col: usize| record.get(col).copied().unwrap_or(f64::NAN);
        let delta = match self.metric {
            GapMetric::Column(col) => at(current, col) - at(previous, col),
            GapMetric::X => at(current, 0) - at(previous, 0),
            GapMetric::Y => at(current, 1) - at(previous, 1),
            GapMetric::Distance => (at(current, 0) - at(previous, 0)).hypot(at(current, 1) - at(previous, 1)),
            GapMetric::GreatCircle => great_circle_km(
                at(previous, 0),
                at(previous, 1),
                at(current, 0),
                at(current, 1),
            ),
        };
        if delta.is_nan() {
            return false;
        }
        match self.sign {
            GapSign::Either => delta.abs() > self.threshold,
            GapSign::Increase => delta > self.threshold,
            GapSign::Decrease => -delta > self.threshold,
        }
    }
}

impl FromStr for GapCriterion {
    type Err = Error;

    /// Parse `x<gap>`, `y<gap>`, `d<gap>` (Cartesian), `D<gap>` (km) or
    /// `<col>z[+|-]<gap>`
    fn from_str(text: &str) -> Result<Self> {
        let bad = |message: &str| Error::invalid_format(text, message);
        let (metric, rest) = if let Some(pos) = text.find('z') {
            let column = text[..pos]
                .parse::<usize>()
                .map_err(|_| bad("column gap needs a column number before 'z'"))?;
            (GapMetric::Column(column), &text[pos + 1..])
        } else {
            let mut chars = text.chars();
            let metric = match chars.next() {
                Some('x') => GapMetric::X,
                Some('y') => GapMetric::Y,
                Some('d') => GapMetric::Distance,
                Some('D') => GapMetric::GreatCircle,
                _ => return Err(bad("expected x, y, d, D or <col>z")),
            };
            (metric, chars.as_str())
        };
        let (sign, number) = match rest.as_bytes().first() {
            Some(b'+') => (GapSign::Increase, &rest[1..]),
            Some(b'-') => (GapSign::Decrease, &rest[1..]),
            _ => (GapSign::Either, rest),
        };
        let threshold = number
            .parse::<f64>()
            .map_err(|_| bad("gap threshold is not a number"))?;
        Ok(GapCriterion::new(metric, threshold).with_sign(sign))
    }
}

impl fmt::Display for GapCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            GapSign::Either => "",
            GapSign::Increase => "+",
            GapSign::Decrease => "-",
        };
        match self.metric {
            GapMetric::Column(col) => write!(f, "{}z{}{}", col, sign, self.threshold),
            GapMetric::X => write!(f, "x{}{}", sign, self.threshold),
            GapMetric::Y => write!(f, "y{}{}", sign, self.threshold),
            GapMetric::Distance => write!(f, "d{}{}", sign, self.threshold),
            GapMetric::GreatCircle => write!(f, "D{}{}", sign, self.threshold),
        }
    }
}

/// Stateful detector comparing each record to the previous one
#[derive(Debug, Clone, Default)]
pub struct GapDetector {
    criteria: Vec<GapCriterion>,
    logic: GapLogic,
    previous: Option<Vec<f64>>,
}

impl GapDetector {
    pub fn new(criteria: Vec<GapCriterion>, logic: GapLogic) -> Self {
        Self {
            criteria,
            logic,
            previous: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.criteria.is_empty()
    }

    /// Forget the previous record, as at a segment boundary
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Check `record` against the previous one and remember it
    pub fn check(&mut self, record: &[f64]) -> bool {
        if self.criteria.is_empty() {
            return false;
        }
        let gap = match &self.previous {
            None => false,
            Some(previous) => match self.logic {
                GapLogic::Any => self.criteria.iter().any(|c| c.is_gap(previous, record)),
                GapLogic::All => self.criteria.iter().all(|c| c.is_gap(previous, record)),
            },
        };
        match self.previous.as_mut() {
            Some(previous) => {
                previous.clear();
                previous.extend_from_slice(record);
            }
            None => self.previous = Some(record.to_vec()),
        }
        gap
    }
}
