use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, BatchReport};
use crate::data::{Classification, DataSet, SideTable};

/// Usable threshold interval of a data set
///
/// A threshold must exceed the background of the non template controls and
/// stay below the exponential end of every sample well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBounds {
    /// Sample bounds with the floor raised to the control maximum
    pub global: (f64, f64),
    /// Largest per-well lower limit and smallest per-well upper limit of the samples
    pub samples: (f64, f64),
    /// Largest raw plateau level among the controls, `None` without controls
    pub ntc_max: Option<f64>,
}

impl ThresholdBounds {
    /// Whether any threshold satisfies every well
    pub fn is_empty(&self) -> bool {
        self.global.0 >= self.global.1
    }

    pub fn contains(&self, threshold: f64) -> bool {
        threshold > self.global.0 && threshold < self.global.1
    }
}

/// Combine the per-well limits recorded by region detection
///
/// Wells of the category named `ntc` contribute their raw `max signal`; every
/// other classified well contributes its `well threshold limits`. Wells of the
/// classification without a recorded value in `dataset` are reported and
/// skipped.
pub fn threshold_bounds(
    dataset: &DataSet,
    classification: &Classification,
    ntc: &str,
) -> (ThresholdBounds, BatchReport<(f64, f64)>) {
    let mut report = BatchReport::new();
    let mut samples = (0.0f64, f64::INFINITY);
    let mut ntc_max: Option<f64> = None;

    for category in classification.groups() {
        let is_control = category.value() == ntc;
        for well in category.wells() {
            let table = if is_control {
                SideTable::MaxSignal
            } else {
                SideTable::ThresholdLimits
            };
            let limits = dataset
                .lookup(&table, well)
                .and_then(|p| p.value().as_pair())
                .ok_or_else(|| AnalysisError::MissingParameter {
                    well: well.clone(),
                    parameter: match table {
                        SideTable::MaxSignal => "max signal".to_string(),
                        _ => "well threshold limits".to_string(),
                    },
                });
            match limits {
                Ok((_, raw)) if is_control => {
                    ntc_max = Some(ntc_max.map_or(raw, |m| m.max(raw)));
                    report.push_ok(well.clone(), (raw, raw));
                }
                Ok((lower, upper)) => {
                    samples.0 = samples.0.max(lower);
                    samples.1 = samples.1.min(upper);
                    report.push_ok(well.clone(), (lower, upper));
                }
                Err(e) => report.record(well.clone(), Err(e)),
            }
        }
    }

    let floor = match ntc_max {
        Some(ntc) => samples.0.max(ntc),
        None => samples.0,
    };
    let bounds = ThresholdBounds {
        global: (floor, samples.1),
        samples,
        ntc_max,
    };
    if bounds.is_empty() {
        tracing::warn!(
            dataset = dataset.name(),
            lower = bounds.global.0,
            upper = bounds.global.1,
            "no threshold satisfies every well"
        );
    }
    (bounds, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Parameter, ParameterName, ParameterValue};

    fn limits(lower: f64, upper: f64) -> Parameter {
        Parameter::new(
            ParameterName::WellThresholdLimits,
            ParameterValue::Pair(lower, upper),
        )
    }

    fn max_signal(raw: f64) -> Parameter {
        Parameter::new(ParameterName::MaxSignal, ParameterValue::Pair(raw / 10.0, raw))
    }

    fn setup() -> (DataSet, Classification) {
        let mut dataset = DataSet::new("amp", "Cycle", "ΔRn");
        dataset.record(&SideTable::ThresholdLimits, "S1", limits(2.0, 8.0));
        dataset.record(&SideTable::ThresholdLimits, "S2", limits(3.0, 9.0));
        dataset.record(&SideTable::MaxSignal, "N1", max_signal(1.0));
        dataset.record(&SideTable::MaxSignal, "N2", max_signal(4.0));

        let mut clf = Classification::new("type");
        clf.add("sample", "S1");
        clf.add("sample", "S2");
        clf.add("NTC", "N1");
        clf.add("NTC", "N2");
        (dataset, clf)
    }

    #[test]
    fn test_control_raises_floor() {
        let (dataset, clf) = setup();
        let (bounds, report) = threshold_bounds(&dataset, &clf, "NTC");
        assert_eq!(bounds.global, (4.0, 8.0));
        assert_eq!(bounds.samples, (3.0, 8.0));
        assert_eq!(bounds.ntc_max, Some(4.0));
        assert!(report.is_complete());
        assert!(bounds.contains(5.0));
        assert!(!bounds.contains(8.5));
    }

    #[test]
    fn test_without_controls() {
        let (dataset, clf) = setup();
        let (bounds, _) = threshold_bounds(&dataset, &clf, "blank");
        // every group is a sample group, the controls lack limits
        assert_eq!(bounds.global, (3.0, 8.0));
        assert_eq!(bounds.ntc_max, None);
    }

    #[test]
    fn test_missing_limits_are_reported() {
        let (dataset, mut clf) = setup();
        clf.add("sample", "S3");
        let (bounds, report) = threshold_bounds(&dataset, &clf, "NTC");
        assert_eq!(bounds.global, (4.0, 8.0));
        assert!(matches!(
            report.failure("S3"),
            Some(AnalysisError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_control_above_ceiling() {
        let (mut dataset, clf) = setup();
        dataset.record(&SideTable::MaxSignal, "N2", max_signal(12.0));
        let (bounds, _) = threshold_bounds(&dataset, &clf, "NTC");
        assert!(bounds.is_empty());
    }
}
