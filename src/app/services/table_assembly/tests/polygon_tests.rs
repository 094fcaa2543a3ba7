//! Tests for polygon closure and polar caps

use super::super::polygon::{accumulated_longitude, close_polygon, detect_polar_cap};
use crate::app::models::{PoleCap, Segment};

fn segment_of(rows: &[[f64; 2]]) -> Segment {
    let mut segment = Segment::new();
    for row in rows {
        segment.push_row(row);
    }
    segment
}

#[test]
fn test_open_polygon_gets_first_row_appended() {
    let mut segment = segment_of(&[[1.0, 1.0], [3.0, 1.0], [2.0, 2.0]]);
    assert!(close_polygon(&mut segment));
    assert_eq!(segment.n_rows(), 4);
    assert_eq!(segment.row(3), Some(vec![1.0, 1.0]));
}

#[test]
fn test_closed_polygon_is_unchanged() {
    let mut segment = segment_of(&[[1.0, 1.0], [3.0, 1.0], [1.0, 1.0]]);
    assert!(!close_polygon(&mut segment));
    assert_eq!(segment.n_rows(), 3);
}

#[test]
fn test_accumulated_longitude_wraps_steps() {
    assert_eq!(accumulated_longitude(&[170.0, -170.0]), 20.0);
    assert_eq!(accumulated_longitude(&[0.0, 90.0, 180.0, 270.0, 360.0]), 360.0);
    assert_eq!(accumulated_longitude(&[10.0, 20.0, 10.0]), 0.0);
}

#[test]
fn test_polar_cap_detection() {
    let mut north = segment_of(&[
        [0.0, 80.0],
        [90.0, 80.0],
        [180.0, 80.0],
        [270.0, 80.0],
        [0.0, 80.0],
    ]);
    assert!(detect_polar_cap(&mut north, 0, 1));
    assert_eq!(north.pole, PoleCap::North);
    assert_eq!(north.lon_override, Some((0.0, 360.0)));

    let mut south = segment_of(&[
        [0.0, -70.0],
        [-120.0, -70.0],
        [120.0, -70.0],
        [0.0, -70.0],
    ]);
    assert!(detect_polar_cap(&mut south, 0, 1));
    assert_eq!(south.pole, PoleCap::South);

    let mut square = segment_of(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
    assert!(!detect_polar_cap(&mut square, 0, 1));
    assert_eq!(square.pole, PoleCap::None);
}
