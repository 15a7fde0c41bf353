//! Tests for grouping analysed wells

use amplicurve::aggregate::*;
use amplicurve::prelude::*;

use crate::curves::*;

/// Duplicate standards at three concentrations plus two controls
fn analysed_plate() -> WellSet {
    let mut wells = Vec::new();
    for (i, (conc, midpoint)) in [(1.0, 26.0), (10.0, 22.5), (100.0, 19.0)].iter().enumerate() {
        for rep in 0..2 {
            let id = format!("S{}{}", i, rep);
            let clean = logistic(40, *midpoint, 900.0 + 50.0 * rep as f64, 0.6);
            let y = noisy(&clean, 1.0, (i * 2 + rep) as u64);
            let mut w = well(&id, &y);
            w.set_category("type", "sample");
            w.set_category("conc", conc.to_string());
            wells.push(w);
        }
    }
    for rep in 0..2 {
        let id = format!("N{}", rep);
        let mut w = well(&id, &drift(40));
        w.set_category("type", "NTC");
        wells.push(w);
    }

    let mut plate = plate(wells);
    let by_type = Classification::from_wells("type", plate.wells(), |w| {
        w.category("type").map(str::to_string)
    });
    let by_conc = Classification::from_wells("conc", plate.wells(), |w| {
        w.category("conc").map(str::to_string)
    });
    plate.add_classification(by_type).unwrap();
    plate.add_classification(by_conc).unwrap();

    let options = AnalysisOptions::default().with_threshold(100.0);
    plate
        .analyze_amplification("amp", &options, &mut AutoAccept)
        .unwrap();
    plate
}

fn concentration(well: &Well) -> Option<f64> {
    well.category("conc").and_then(|c| c.parse().ok())
}

#[test]
fn test_step_pipeline() {
    let mut plate = analysed_plate();
    let by_conc = plate.classification("conc").unwrap().clone();

    let (max, report) = max_signal_series(plate.wells(), &by_conc, concentration, "ng");
    assert!(report.is_complete());
    assert_eq!(max.len(), 3);
    assert!(max.iter().all(|s| s.norm.is_some()));

    let (min, report) = min_signal_series(&max, plate.wells_mut(), AMPLIFICATION_READING, "ΔRn");
    assert!(report.is_complete(), "{}", report);
    let (steps, report) = step_series(&max, &min, plate.wells_mut(), "RFU");
    assert!(report.is_complete());

    for serie in &steps {
        for (id, step) in serie.wells.iter().zip(serie.y.iter()) {
            let step = step.unwrap();
            assert!(step > 0.5 && step < 1.0, "{}: {}", id, step);
            let param = plate
                .well(id)
                .and_then(|w| w.parameter(&ParameterName::StepSignal))
                .and_then(|p| p.value().as_pair())
                .unwrap();
            assert_eq!(param.0, step);
        }
    }

    let mean = series_mean("all", steps.iter());
    assert_eq!(mean.points.len(), 3);
    assert!(mean.points.iter().all(|p| p.n == 2));
}

#[test]
fn test_plate_threshold_bounds() {
    let plate = analysed_plate();
    let dataset = plate.dataset("amp").unwrap();
    let by_type = plate.classification("type").unwrap();
    let (bounds, report) = threshold_bounds(dataset, by_type, "NTC");

    assert!(report.is_complete());
    let ntc = bounds.ntc_max.unwrap();
    assert!(ntc > BASELINE && ntc < 8.0);
    assert_eq!(bounds.global.0, bounds.samples.0.max(ntc));
    assert_eq!(bounds.global.1, bounds.samples.1);
    assert!(!bounds.is_empty());
    assert!(bounds.contains(bounds.global.0 + 1e-6));
}

#[test]
fn test_group_means_of_replicates() {
    let plate = analysed_plate();
    let by_conc = plate.classification("conc").unwrap();
    let (max, _) = max_signal_series(plate.wells(), by_conc, concentration, "ng");

    let groups = vec![(
        "low and high".to_string(),
        vec!["1".to_string(), "100".to_string()],
    )];
    let means = group_statistics(&max, &groups).unwrap();
    assert_eq!(means[0].x(), vec![1.0, 100.0]);
    assert!(means[0].points.iter().all(|p| p.n == 1));

    let collapsed = mean_internal_replicates(&max[0]);
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed.wells.len(), 2);
}
