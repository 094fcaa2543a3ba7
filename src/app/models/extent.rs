//! Longitude extent determination by quadrant voting.
//!
//! A run of longitudes has two candidate extents: one measured in the
//! -180/180 framing and one in the 0/360 framing. Tracking which 90-degree
//! quadrants received data tells us which framing avoids a false span across
//! the prime meridian or the antimeridian.

use super::{LonRange, update_min_max};

/// Quadrant presence and per-framing extents for one longitude column
#[derive(Debug, Clone)]
pub struct LonQuadrants {
    quadrants: [bool; 4],
    min: [f64; 2],
    max: [f64; 2],
}

impl Default for LonQuadrants {
    fn default() -> Self {
        Self::new()
    }
}

impl LonQuadrants {
    const FRAMINGS: [LonRange; 2] = [LonRange::Minus180To180, LonRange::ZeroTo360];

    pub fn new() -> Self {
        Self {
            quadrants: [false; 4],
            min: [f64::NAN; 2],
            max: [f64::NAN; 2],
        }
    }

    /// Record one longitude; NaN is ignored
    pub fn add(&mut self, lon: f64) {
        if lon.is_nan() {
            return;
        }
        for (way, framing) in Self::FRAMINGS.iter().enumerate() {
            let x = framing.adjust(lon);
            update_min_max(&mut self.min[way], &mut self.max[way], x);
        }
        let x = LonRange::ZeroTo360.adjust(lon);
        let quadrant = ((x / 90.0).floor() as usize).min(3);
        self.quadrants[quadrant] = true;
    }

    /// Merge another set of votes into this one
    pub fn merge(&mut self, other: &LonQuadrants) {
        for q in 0..4 {
            self.quadrants[q] |= other.quadrants[q];
        }
        for way in 0..2 {
            update_min_max(&mut self.min[way], &mut self.max[way], other.min[way]);
            update_min_max(&mut self.min[way], &mut self.max[way], other.max[way]);
        }
    }

    /// Number of quadrants that received data
    pub fn quadrant_count(&self) -> usize {
        self.quadrants.iter().filter(|&&q| q).count()
    }

    /// Pick the framing and return `(min, max)`, or `None` with no data
    ///
    /// Data on both sides of Greenwich forces -180/180; data on both sides of
    /// the antimeridian forces 0/360; data only in opposite diagonal
    /// quadrants takes the framing with the shorter span; otherwise the
    /// `default` framing is used.
    pub fn finalize(&self, default: LonRange) -> Option<(f64, f64)> {
        if self.quadrant_count() == 0 {
            return None;
        }
        let q = &self.quadrants;
        let way = if q[0] && q[3] {
            0
        } else if q[1] && q[2] {
            1
        } else if self.quadrant_count() == 2 && ((q[0] && q[2]) || (q[1] && q[3])) {
            if (self.max[0] - self.min[0]) < (self.max[1] - self.min[1]) {
                0
            } else {
                1
            }
        } else {
            match default {
                LonRange::Minus180To180 => 0,
                LonRange::ZeroTo360 => 1,
            }
        };

        let mut min = self.min[way];
        let mut max = self.max[way];
        if min > max {
            min -= 360.0;
        }
        if min < 0.0 && max < 0.0 {
            min += 360.0;
            max += 360.0;
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(lons: &[f64]) -> Option<(f64, f64)> {
        let mut q = LonQuadrants::new();
        for &lon in lons {
            q.add(lon);
        }
        q.finalize(LonRange::Minus180To180)
    }

    #[test]
    fn test_no_data() {
        assert_eq!(extent(&[]), None);
        assert_eq!(extent(&[f64::NAN]), None);
    }

    #[test]
    fn test_across_greenwich_uses_signed_framing() {
        assert_eq!(extent(&[-10.0, 5.0, 20.0]), Some((-10.0, 20.0)));
        assert_eq!(extent(&[350.0, 5.0]), Some((-10.0, 5.0)));
    }

    #[test]
    fn test_across_antimeridian_uses_positive_framing() {
        assert_eq!(extent(&[170.0, -170.0]), Some((170.0, 190.0)));
    }

    #[test]
    fn test_all_negative_shifted_positive() {
        // Both framings agree on quadrant 2 only; default framing then the
        // all-negative shift applies.
        assert_eq!(extent(&[-120.0, -100.0]), Some((240.0, 260.0)));
    }

    #[test]
    fn test_diagonal_quadrants_pick_shorter_span() {
        // Quadrants 0 and 2: 10 and 190 are 180 apart in both framings; the
        // 0/360 span wins ties.
        assert_eq!(extent(&[10.0, 190.0]), Some((10.0, 190.0)));
        // Quadrants 1 and 3: 100 and 280 (-80): -80..100 is 180, 100..280
        // is 180 as well, so again 0/360.
        assert_eq!(extent(&[100.0, -80.0]), Some((100.0, 280.0)));
    }

    #[test]
    fn test_merge_combines_votes() {
        let mut a = LonQuadrants::new();
        a.add(-10.0);
        let mut b = LonQuadrants::new();
        b.add(10.0);
        a.merge(&b);
        assert_eq!(a.finalize(LonRange::ZeroTo360), Some((-10.0, 10.0)));
    }
}
