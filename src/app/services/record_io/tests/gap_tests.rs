//! Tests for gap criteria

use super::super::gap::{GapCriterion, GapDetector, GapLogic, GapMetric, GapSign};

#[test]
fn test_parse_criteria() {
    let gap: GapCriterion = "2z+5".parse().unwrap();
    assert_eq!(gap.metric, GapMetric::Column(2));
    assert_eq!(gap.sign, GapSign::Increase);
    assert_eq!(gap.threshold, 5.0);

    let gap: GapCriterion = "D100".parse().unwrap();
    assert_eq!(gap.metric, GapMetric::GreatCircle);
    assert_eq!(gap.sign, GapSign::Either);

    assert_eq!("x0.5".parse::<GapCriterion>().unwrap().metric, GapMetric::X);
    assert!("q5".parse::<GapCriterion>().is_err());
    assert!("az5".parse::<GapCriterion>().is_err());
    assert!("x".parse::<GapCriterion>().is_err());
}

#[test]
fn test_display_parses_back() {
    for text in ["0z5", "3z-2.5", "x1", "y+4", "d10", "D250"] {
        let gap: GapCriterion = text.parse().unwrap();
        assert_eq!(gap.to_string(), text);
    }
}

#[test]
fn test_signed_column_delta() {
    let up = GapCriterion::new(GapMetric::Column(1), 5.0).with_sign(GapSign::Increase);
    let down = GapCriterion::new(GapMetric::Column(1), 5.0).with_sign(GapSign::Decrease);
    let either = GapCriterion::new(GapMetric::Column(1), 5.0);

    assert!(up.is_gap(&[0.0, 0.0], &[0.0, 6.0]));
    assert!(!up.is_gap(&[0.0, 6.0], &[0.0, 0.0]));
    assert!(down.is_gap(&[0.0, 6.0], &[0.0, 0.0]));
    assert!(either.is_gap(&[0.0, 6.0], &[0.0, 0.0]));
    assert!(!either.is_gap(&[0.0, 0.0], &[0.0, 5.0]));
}

#[test]
fn test_nan_never_makes_a_gap() {
    let gap = GapCriterion::new(GapMetric::Distance, 1.0);
    assert!(!gap.is_gap(&[0.0, 0.0], &[f64::NAN, 100.0]));
    assert!(!gap.is_gap(&[0.0], &[100.0]));
}

#[test]
fn test_great_circle_distance() {
    // One degree of latitude is about 111.2 km
    let gap = GapCriterion::new(GapMetric::GreatCircle, 111.0);
    assert!(gap.is_gap(&[0.0, 0.0], &[0.0, 1.0]));
    let gap = GapCriterion::new(GapMetric::GreatCircle, 112.0);
    assert!(!gap.is_gap(&[0.0, 0.0], &[0.0, 1.0]));
    // Across the antimeridian the points are close
    assert!(!gap.is_gap(&[179.5, 0.0], &[-179.5, 0.0]));
}

#[test]
fn test_detector_logic_and_reset() {
    let criteria = vec![
        GapCriterion::new(GapMetric::X, 5.0),
        GapCriterion::new(GapMetric::Y, 5.0),
    ];
    let mut any = GapDetector::new(criteria.clone(), GapLogic::Any);
    let mut all = GapDetector::new(criteria, GapLogic::All);

    for detector in [&mut any, &mut all] {
        assert!(!detector.check(&[0.0, 0.0]));
    }
    assert!(any.check(&[10.0, 1.0]));
    assert!(!all.check(&[10.0, 1.0]));
    assert!(all.check(&[20.0, 20.0]));

    any.reset();
    assert!(!any.check(&[500.0, 500.0]));
    assert!(!GapDetector::default().check(&[1.0]));
}
