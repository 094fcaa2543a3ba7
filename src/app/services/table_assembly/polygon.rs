//! Polygon closure and polar-cap detection

use tracing::debug;

use crate::app::models::{PoleCap, Segment};
use crate::constants::POLAR_CAP_TOLERANCE_DEG;

/// Append a copy of the first row when the first and last rows differ
///
/// Returns whether a row was added.
pub fn close_polygon(segment: &mut Segment) -> bool {
    if segment.is_closed() {
        return false;
    }
    let Some(first) = segment.row(0) else {
        return false;
    };
    segment.push_row(&first);
    true
}

/// Sum of longitude steps, each wrapped into -180..180
pub fn accumulated_longitude(lons: &[f64]) -> f64 {
    lons.windows(2)
        .map(|pair| {
            let mut step = pair[1] - pair[0];
            if step > 180.0 {
                step -= 360.0;
            } else if step < -180.0 {
                step += 360.0;
            }
            step
        })
        .filter(|step| !step.is_nan())
        .sum()
}

/// Mark a closed geographic polygon that winds once around a pole
///
/// Such a polygon gets the full 0..360 longitude extent and its latitude
/// extent reaches the pole on the side of its mean latitude.
pub fn detect_polar_cap(segment: &mut Segment, lon_col: usize, lat_col: usize) -> bool {
    let (Some(lons), Some(lats)) = (segment.column(lon_col), segment.column(lat_col)) else {
        return false;
    };
    let turn = accumulated_longitude(lons);
    if (turn.abs() - 360.0).abs() > POLAR_CAP_TOLERANCE_DEG {
        return false;
    }
    let valid: Vec<f64> = lats.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return false;
    }
    let mean_lat = valid.iter().sum::<f64>() / valid.len() as f64;
    segment.pole = if mean_lat >= 0.0 {
        PoleCap::North
    } else {
        PoleCap::South
    };
    segment.lon_override = Some((0.0, 360.0));
    debug!(
        "Polygon winds {:.1} degrees around the {:?} pole",
        turn, segment.pole
    );
    true
}
