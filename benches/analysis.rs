use amplicurve::analysis::{
    crossing_by_interpolation, detect_region, resolve_thresholds, DerivativeConvention,
    InterpolationKind,
};
use amplicurve::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn logistic(midpoint: f64, height: f64) -> Vec<f64> {
    (0..40)
        .map(|c| 5.0 + height / (1.0 + (-(c as f64 - midpoint) * 0.6).exp()))
        .collect()
}

/// Build a plate of n amplified wells with slight variation
fn build_plate(n: usize) -> WellSet {
    let x: Vec<f64> = (0..40).map(|c| c as f64).collect();
    let wells: Vec<Well> = (0..n)
        .map(|i| {
            let midpoint = 16.0 + (i as f64 % 11.0) * 0.8;
            Well::builder(format!("W{}", i))
                .amplification("Cycle", &x, "ΔRn", &logistic(midpoint, 900.0 + i as f64))
                .build()
        })
        .collect();
    let mut plate = WellSet::new("bench", wells);
    let source = SeriesSource::new(AMPLIFICATION_READING, "Cycle", "ΔRn");
    let dataset = DataSet::from_wells("amp", plate.wells(), &source).unwrap();
    plate.assign_dataset(dataset);
    plate
}

fn bench_detect_region(c: &mut Criterion) {
    let y = logistic(20.0, 1000.0);
    let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ny: Vec<f64> = y.iter().map(|v| v / max).collect();
    c.bench_function("detect_region", |b| {
        b.iter(|| detect_region(black_box(&ny), DerivativeConvention::Forward, true))
    });
}

fn bench_interpolation_crossing(c: &mut Criterion) {
    let x: Vec<f64> = (0..40).map(|c| c as f64).collect();
    let y = logistic(20.0, 1000.0);
    let mut group = c.benchmark_group("crossing_by_interpolation");
    for kind in [
        InterpolationKind::Linear,
        InterpolationKind::Quadratic,
        InterpolationKind::Cubic,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{:?}", kind)), &kind, |b, k| {
            b.iter(|| crossing_by_interpolation(black_box(&x), black_box(&y), 300.0, *k, 10, 1000))
        });
    }
    group.finish();
}

fn bench_plate_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("plate_analysis");
    for size in [24, 96, 384] {
        let template = build_plate(size);
        let options = AnalysisOptions::default().with_threshold(200.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut plate = template.clone();
                plate
                    .analyze_amplification("amp", black_box(&options), &mut AutoAccept)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_threshold_pass(c: &mut Criterion) {
    let mut plate = build_plate(96);
    let options = AnalysisOptions::default().with_threshold(200.0);
    plate
        .analyze_amplification("amp", &options, &mut AutoAccept)
        .unwrap();
    c.bench_function("resolve_thresholds_96", |b| {
        b.iter(|| {
            let (dataset, wells) = plate.dataset_and_wells_mut("amp").unwrap();
            resolve_thresholds(dataset, wells, black_box(&options), &mut AutoAccept).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_detect_region,
    bench_interpolation_crossing,
    bench_plate_analysis,
    bench_threshold_pass
);
criterion_main!(benches);
