//! Tests for exponential region detection

use amplicurve::analysis::*;
use amplicurve::prelude::*;

use crate::curves::*;

fn normalise(y: &[f64]) -> Vec<f64> {
    let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    y.iter().map(|v| v / max).collect()
}

#[test]
fn test_region_is_reproducible() {
    let y = normalise(&noisy(&logistic(40, 20.0, 1000.0, 0.6), 2.0, 7));
    for convention in [
        DerivativeConvention::Forward,
        DerivativeConvention::Central,
        DerivativeConvention::Backward,
    ] {
        let first = detect_region(&y, convention, true).unwrap();
        let second = detect_region(&y, convention, true).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_region_ordering_over_seeds() {
    for seed in 0..20 {
        let y = normalise(&noisy(&logistic(40, 18.0 + seed as f64 % 5.0, 900.0, 0.5), 3.0, seed));
        for convention in [
            DerivativeConvention::Forward,
            DerivativeConvention::Central,
            DerivativeConvention::Backward,
        ] {
            let region = detect_region(&y, convention, true).unwrap();
            let (p1, p2) = region.exponential.expect("amplified curve");
            let p3 = region.plateau_start().unwrap();
            assert!(p1 <= p2, "seed {}: p1 {} > p2 {}", seed, p1, p2);
            assert!(p2 < p3, "seed {}: p2 {} >= p3 {}", seed, p2, p3);
            assert!(p3 < y.len());
        }
    }
}

#[test]
fn test_region_brackets_the_rise() {
    let y = normalise(&noisy(&logistic(40, 20.0, 1000.0, 0.6), 2.0, 11));
    let region = detect_region(&y, DerivativeConvention::Forward, true).unwrap();
    let (p1, p2) = region.exponential.unwrap();
    assert!((13..=20).contains(&p1), "p1 = {}", p1);
    assert!((19..=25).contains(&p2), "p2 = {}", p2);
}

#[test]
fn test_late_rise_clamps_plateau() {
    // the curve is still rising on the last cycle
    let y = normalise(&logistic(30, 29.0, 1000.0, 0.8));
    let region = detect_region(&y, DerivativeConvention::Backward, true).unwrap();
    assert_eq!(region.plateau_start(), Some(29));
    let (_, p2) = region.exponential.unwrap();
    assert!(p2 < 29);
}

#[test]
fn test_shared_normalisation() {
    let mut plate = plate(vec![
        well("low", &logistic(40, 20.0, 200.0, 0.6)),
        well("high", &logistic(40, 20.0, 1000.0, 0.6)),
    ]);
    let (dataset, wells) = plate.dataset_and_wells_mut("amp").unwrap();
    let report = detect_regions(dataset, wells, &AnalysisOptions::default(), &mut AutoAccept)
        .unwrap();
    assert!(report.is_complete());

    let low = report.success("low").unwrap().max_signal;
    let high = report.success("high").unwrap().max_signal;
    // both levels share the scale of the highest well
    assert!(low.0 < 0.25);
    assert!(high.0 > 0.9);
    assert!((high.1 / high.0 - low.1 / low.0).abs() < 1e-9);
}

#[test]
fn test_review_sees_every_well_once() {
    let mut plate = plate(vec![
        well("A1", &logistic(40, 18.0, 1000.0, 0.6)),
        well("A2", &logistic(40, 24.0, 1000.0, 0.6)),
    ]);
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let region_log = seen.clone();
    let mut strategy = HumanInTheLoop::new(
        move |review: &RegionReview<'_>| {
            region_log.borrow_mut().push(review.well.to_string());
            RegionDecision::Accept
        },
        |_: &PlateauReview<'_>| PlateauDecision::UseMaximum,
    );
    let (dataset, wells) = plate.dataset_and_wells_mut("amp").unwrap();
    let report =
        detect_regions(dataset, wells, &AnalysisOptions::default(), &mut strategy).unwrap();

    assert_eq!(*seen.borrow(), vec!["A1".to_string(), "A2".to_string()]);
    let outcome = report.success("A1").unwrap();
    assert_eq!(outcome.region.plateau, Plateau::Maximum);
    assert!((outcome.max_signal.0 - 1.0).abs() < 1e-3);
}

#[test]
fn test_no_exponential_override() {
    let mut plate = plate(vec![well("A1", &logistic(40, 20.0, 1000.0, 0.6))]);
    let options = AnalysisOptions::default();
    let (dataset, wells) = plate.dataset_and_wells_mut("amp").unwrap();
    let outcome = apply_region(dataset, wells, "A1", [-1, -1, 30], &options).unwrap();

    assert_eq!(outcome.region.exponential, None);
    assert_eq!(outcome.exponential.len(), 1);
    assert_eq!(outcome.threshold_limits.1, f64::INFINITY);
    let raw = plate
        .well("A1")
        .unwrap()
        .parameter(&ParameterName::ResponseRegion)
        .and_then(|p| p.value().as_region())
        .map(|r| r.to_raw());
    assert_eq!(raw, Some([-1, -1, 30]));
}
