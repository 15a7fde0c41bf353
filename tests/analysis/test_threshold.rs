//! Tests for threshold crossing and melting peak resolution

use amplicurve::analysis::*;
use amplicurve::optimize::{ExpLinear, Model};
use amplicurve::prelude::*;
use approx::assert_relative_eq;

use crate::curves::*;

#[test]
fn test_model_path_round_trip() {
    let mut plate = plate(vec![well("A1", &noisy(&logistic(40, 20.0, 1000.0, 0.6), 1.0, 5))]);
    let options = AnalysisOptions::default().with_threshold(150.0);
    let summary = plate
        .analyze_amplification("amp", &options, &mut AutoAccept)
        .unwrap();
    let crossing = *summary.crossings.unwrap().success("A1").unwrap();
    assert_eq!(crossing.method, CrossingMethod::Model);

    let stored = plate
        .dataset("amp")
        .and_then(|d| d.lookup(&SideTable::Exponential, "A1"))
        .and_then(|p| p.value().as_tuple())
        .unwrap()
        .to_vec();
    let model = ExpLinear::new(stored[2]);
    assert_relative_eq!(
        model.eval(crossing.value, &stored[..2]),
        150.0,
        max_relative = 1e-9
    );
    // the fitted exponential crosses close to the sampled curve
    assert!((crossing.value - 17.0).abs() < 1.5, "Ct = {}", crossing.value);
    assert!(crossing.window.1 >= crossing.value);
}

#[test]
fn test_fallback_never_overshoots() {
    let y = logistic(40, 20.0, 1000.0, 0.6);
    let x = cycles(40);
    for threshold in [50.0, 200.0, 505.0, 900.0] {
        let ct =
            crossing_by_interpolation(&x, &y, threshold, InterpolationKind::Cubic, 10, 1000)
                .unwrap();
        let interp = Interpolator::new(InterpolationKind::Cubic, &x, &y).unwrap();
        assert!(interp.eval(ct) <= threshold);
        // exact crossing of the underlying logistic
        let exact = 20.0 - ((1000.0 / (threshold - BASELINE)) - 1.0).ln() / 0.6;
        assert!((ct - exact).abs() < 0.1, "threshold {}: {} vs {}", threshold, ct, exact);
    }
}

#[test]
fn test_fallback_kinds_agree() {
    let y = logistic(40, 20.0, 1000.0, 0.6);
    let x = cycles(40);
    let values: Vec<f64> = [
        InterpolationKind::Linear,
        InterpolationKind::Quadratic,
        InterpolationKind::Cubic,
    ]
    .iter()
    .map(|kind| crossing_by_interpolation(&x, &y, 300.0, *kind, 10, 1000).unwrap())
    .collect();
    for v in &values {
        assert!((v - values[2]).abs() < 0.25);
    }
}

#[test]
fn test_step_kinds_bracket() {
    let x = cycles(5);
    let y = [0.0, 1.0, 2.0, 3.0, 4.0];
    let prev =
        crossing_by_interpolation(&x, &y, 2.5, InterpolationKind::Previous, 10, 1000).unwrap();
    let next = crossing_by_interpolation(&x, &y, 2.5, InterpolationKind::Next, 10, 1000).unwrap();
    assert!(next <= prev);
    assert!(prev <= 3.0 && prev > 2.0);
    assert!(next <= 2.0 && next > 1.0);
}

#[test]
fn test_unreached_threshold() {
    let y = logistic(40, 20.0, 100.0, 0.6);
    let err = crossing_by_interpolation(
        &cycles(40),
        &y,
        500.0,
        InterpolationKind::Quadratic,
        10,
        1000,
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::ThresholdNotReached { .. }));
}

#[test]
fn test_time_threshold_label() {
    let mut plate = plate(vec![well("A1", &logistic(40, 20.0, 1000.0, 0.6))]);
    let options = AnalysisOptions::default()
        .with_threshold(100.0)
        .with_crossing(CrossingLabel::Tt);
    plate
        .analyze_amplification("amp", &options, &mut AutoAccept)
        .unwrap();
    let well = plate.well("A1").unwrap();
    assert!(well.parameter(&ParameterName::Tt).is_some());
    assert!(well.parameter(&ParameterName::Ct).is_none());
}

#[test]
fn test_dataset_threshold_wins() {
    let mut plate = plate(vec![well("A1", &logistic(40, 20.0, 1000.0, 0.6))]);
    plate.dataset_mut("amp").unwrap().set_threshold(500.0);
    let options = AnalysisOptions::default().with_threshold(50.0);
    let summary = plate
        .analyze_amplification("amp", &options, &mut AutoAccept)
        .unwrap();
    let value = summary.crossings.unwrap().success("A1").unwrap().value;
    assert!(value > 18.0, "Ct = {}", value);
}

#[test]
fn test_no_threshold_skips_crossings() {
    let mut plate = plate(vec![well("A1", &logistic(40, 20.0, 1000.0, 0.6))]);
    let summary = plate
        .analyze_amplification("amp", &AnalysisOptions::default(), &mut AutoAccept)
        .unwrap();
    assert!(summary.crossings.is_none());
    assert!(summary.regions.is_complete());
}

#[test]
fn test_options_from_json() {
    let options = AnalysisOptions::default()
        .with_interpolation(InterpolationKind::Cubic)
        .with_derivative(DerivativeConvention::Central)
        .with_threshold(0.2);
    let json = options.to_json().unwrap();
    let parsed = AnalysisOptions::from_json(&json).unwrap();
    assert_eq!(parsed, options);
    assert!(AnalysisOptions::from_json("{}").is_err());
}

#[test]
fn test_melting_peaks() {
    let x: Vec<f64> = (0..61).map(|i| 65.0 + i as f64 * 0.5).collect();
    let peak = |center: f64| -> Vec<f64> {
        x.iter()
            .map(|t| 100.0 * (-(t - center).powi(2) / 3.0).exp())
            .collect()
    };
    let wells = vec![
        Well::builder("A1")
            .reading("Melt", "")
            .column("Temperature", "°C", &x)
            .column("-dF/dT", "", &peak(81.2))
            .build(),
        Well::builder("A2")
            .reading("Melt", "")
            .column("Temperature", "°C", &x)
            .column("-dF/dT", "", &peak(86.7))
            .build(),
    ];
    let mut plate = WellSet::new("plate", wells);
    let source = SeriesSource::new("Melt", "Temperature", "-dF/dT");
    let dataset = DataSet::from_wells("melt", plate.wells(), &source).unwrap();
    plate.assign_dataset(dataset);

    let (dataset, wells) = plate.dataset_and_wells_mut("melt").unwrap();
    let report = resolve_melting_peaks(
        dataset,
        wells,
        &AnalysisOptions::default().with_interpolation(InterpolationKind::Cubic),
        &mut AutoAccept,
    );
    assert!(report.is_complete());
    assert!((report.success("A1").unwrap() - 81.2).abs() < 0.1);
    assert!((report.success("A2").unwrap() - 86.7).abs() < 0.1);
    let tm = plate.well("A2").unwrap().parameter(&ParameterName::Tm).unwrap();
    assert_eq!(tm.unit(), "°C");
}
