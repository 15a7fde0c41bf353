//! Synthetic amplification curves
#![allow(dead_code)]

use amplicurve::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub const BASELINE: f64 = 5.0;

pub fn cycles(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

/// Baseline plus a logistic rise centred on `midpoint`
pub fn logistic(n: usize, midpoint: f64, height: f64, rate: f64) -> Vec<f64> {
    cycles(n)
        .iter()
        .map(|c| BASELINE + height / (1.0 + (-(c - midpoint) * rate).exp()))
        .collect()
}

/// Concave drift of a well without template
pub fn drift(n: usize) -> Vec<f64> {
    cycles(n)
        .iter()
        .map(|c| BASELINE + 0.1 * c - 0.002 * c * c)
        .collect()
}

/// Add seeded gaussian noise
pub fn noisy(y: &[f64], sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sd).unwrap();
    y.iter().map(|v| v + normal.sample(&mut rng)).collect()
}

pub fn well(id: &str, y: &[f64]) -> Well {
    Well::builder(id)
        .amplification("Cycle", &cycles(y.len()), "ΔRn", y)
        .build()
}

pub fn source() -> SeriesSource {
    SeriesSource::new(AMPLIFICATION_READING, "Cycle", "ΔRn")
}

/// Plate holding the wells and an `amp` data set built from them
pub fn plate(wells: Vec<Well>) -> WellSet {
    let mut plate = WellSet::new("plate", wells);
    let dataset = DataSet::from_wells("amp", plate.wells(), &source()).unwrap();
    plate.assign_dataset(dataset);
    plate
}
