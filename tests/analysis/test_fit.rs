//! Tests for bounded curve fitting

use amplicurve::optimize::*;
use approx::assert_relative_eq;

use crate::curves::*;

#[test]
fn test_noisy_exponential_recovery() {
    let x = cycles(15);
    let truth = [0.2, -3.0];
    let model = ExpLinear::new(1.0);
    let clean = model.curve(&x, &truth);
    let y: Vec<f64> = noisy(&clean, 1e-4, 3)
        .iter()
        .zip(&clean)
        .map(|(n, c)| c * (1.0 + (n - c) * 10.0))
        .collect();

    let result = fit(
        &x,
        &y,
        &model,
        &[0.5, -2.0],
        &Bounds::free(2),
        FitWindow::full(),
        &FitOptions::default(),
    )
    .unwrap();
    assert_relative_eq!(result.params[0], truth[0], max_relative = 0.05);
    assert_relative_eq!(result.params[1], truth[1], max_relative = 0.05);
    assert!(result.r_squared > 0.99);
    assert_eq!(result.x.len(), 15);
}

#[test]
fn test_sigmoid_fit() {
    let x = cycles(40);
    let truth = [1000.0, -20.0, 0.6];
    let y = noisy(&Sigmoid.curve(&x, &truth), 5.0, 21);
    let options = FitOptions {
        max_iters: 20000,
        sd_tolerance: 1e-10,
    };
    let result = fit(
        &x,
        &y,
        &Sigmoid,
        &[950.0, -19.0, 0.5],
        &Bounds::new(vec![
            ParamBound::at_least(0.0),
            ParamBound::free(),
            ParamBound::at_least(0.0),
        ]),
        FitWindow::full(),
        &options,
    )
    .unwrap();
    assert_relative_eq!(result.params[0], 1000.0, max_relative = 0.02);
    assert_relative_eq!(result.params[1], -20.0, max_relative = 0.02);
    assert!(result.r_squared > 0.99);
    let midpoint = Sigmoid.invert(500.0, &result.params);
    assert!((midpoint - 20.0).abs() < 0.3);
}

#[test]
fn test_r_squared_on_window_only() {
    let x = cycles(20);
    // linear for the first ten points, garbage afterwards
    let y: Vec<f64> = x
        .iter()
        .map(|v| if *v < 10.0 { 2.0 * v + 1.0 } else { 100.0 - v * v })
        .collect();
    let result = fit(
        &x,
        &y,
        &Linear,
        &[1.0, 0.0],
        &Bounds::free(2),
        FitWindow::new(0, 10),
        &FitOptions::default(),
    )
    .unwrap();
    assert_relative_eq!(result.r_squared, 1.0, epsilon = 1e-9);
    assert_eq!(result.y_fit.len(), 10);
}

#[test]
fn test_bounded_fit_stays_feasible() {
    let x = cycles(10);
    let y: Vec<f64> = x.iter().map(|v| -0.5 * v + 3.0).collect();
    let result = fit(
        &x,
        &y,
        &Linear,
        &[0.5, 0.0],
        &Bounds::new(vec![ParamBound::at_least(0.0), ParamBound::free()]),
        FitWindow::full(),
        &FitOptions::default(),
    )
    .unwrap();
    assert!(result.params[0] >= 0.0);
    assert!(result.r_squared < 0.5);
}

#[test]
fn test_window_too_small() {
    let x = cycles(10);
    let y = x.clone();
    let err = fit(
        &x,
        &y,
        &Linear,
        &[1.0, 0.0],
        &Bounds::free(2),
        FitWindow::new(4, 5),
        &FitOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, FitError::InsufficientData { n: 1, .. }));
}
