//! Exponential region and plateau detection
//!
//! For every well of a data set:
//!
//! 1. the signal is divided by the maximum over *all* wells of the data set,
//! 2. the second derivative `ddy[i] = (y[i] + y[i+2] - 2 y[i+1]) / 4` is computed,
//! 3. `p1` is the arg-max of `ddy`, `p2` the arg-min of `ddy` at or after `p1`,
//!    both shifted by the [DerivativeConvention] offset, and `p3 = p2 + 2`,
//! 4. a region stored on the well by an earlier pass replaces the computed one,
//! 5. the [DecisionStrategy] confirms or overrides the region, then the plateau,
//! 6. the plateau level and the exponential parameters are fitted.
//!
//! The results are written to the well as parameters and to the data set side
//! tables.

use crate::data::{
    Assignment, DataSet, Parameter, ParameterName, ParameterValue, Plateau, ResponseRegion,
    SideTable, Well,
};
use crate::optimize::{fit, Flat, FitWindow, Linear};

use super::error::AnalysisError;
use super::report::BatchReport;
use super::strategy::{
    DecisionStrategy, Overrides, PlateauDecision, PlateauReview, RegionDecision, RegionReview,
};
use super::types::{AnalysisOptions, DerivativeConvention};

/// Everything the detector derived for one well
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutcome {
    pub region: ResponseRegion,
    /// Plateau level `(normalised, raw)`
    pub max_signal: (f64, f64),
    /// `[a, b, N]` of `N * 10^(a*x + b)`, or `[level]` without exponential region
    pub exponential: Vec<f64>,
    /// R² of the exponential fit on the log scale
    pub r_squared: Option<f64>,
    /// Usable threshold interval of this well, raw units
    pub threshold_limits: (f64, f64),
    /// Parameters whose replacement was declined; the well and the side
    /// tables still hold the earlier values
    pub kept: Vec<ParameterName>,
}

/// Three-point second derivative, two samples shorter than `y`
pub fn second_derivative(y: &[f64]) -> Vec<f64> {
    y.windows(3)
        .map(|w| (w[0] + w[2] - 2.0 * w[1]) / 4.0)
        .collect()
}

/// Divide by the largest absolute value; an all-zero input is returned unchanged
fn normalize_abs(values: &[f64]) -> Vec<f64> {
    let max_abs = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max_abs > 0.0 {
        values.iter().map(|v| v / max_abs).collect()
    } else {
        values.to_vec()
    }
}

/// First index of the largest value
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if *v <= b => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}

/// First index of the smallest value
fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if *v >= b => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}

/// Compute the response region of a normalised signal
///
/// With `detect_flat`, a signal without positive curvature has no exponential
/// region and uses its maximum as plateau. Otherwise `p1 <= p2 < p3 <= n - 1`.
pub fn detect_region(
    y: &[f64],
    convention: DerivativeConvention,
    detect_flat: bool,
) -> Result<ResponseRegion, AnalysisError> {
    let n = y.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData { n, required: 3 });
    }
    let ddy = second_derivative(y);
    let peak = argmax(&ddy).ok_or(AnalysisError::InsufficientData { n, required: 3 })?;
    if detect_flat && ddy[peak] <= 0.0 {
        return Ok(ResponseRegion {
            exponential: None,
            plateau: Plateau::Maximum,
        });
    }
    let trough = peak + argmin(&ddy[peak..]).unwrap_or(0);

    let offset = convention.offset();
    let p2 = (trough + offset).min(n - 2);
    let p1 = (peak + offset).min(p2);
    let p3 = (p2 + 2).min(n - 1);
    Ok(ResponseRegion::new(p1, p2, p3))
}

/// Whether a region satisfies `p1 <= p2 < p3 < n`
fn check_region(well: &str, region: &ResponseRegion, n: usize) -> Result<(), AnalysisError> {
    let invalid = |reason: String| AnalysisError::InvalidRegion {
        well: well.to_string(),
        reason,
    };
    if let Some((p1, p2)) = region.exponential {
        if p1 > p2 || p2 >= n {
            return Err(invalid(format!(
                "exponential region [{}, {}] outside 0..{}",
                p1 as i64, p2 as i64, n
            )));
        }
        if let Some(p3) = region.plateau_start() {
            if p3 <= p2 {
                return Err(invalid(format!(
                    "plateau start {} not after exponential end {}",
                    p3, p2
                )));
            }
        }
    }
    if let Some(p3) = region.plateau_start() {
        if p3 >= n {
            return Err(invalid(format!("plateau start {} outside 0..{}", p3, n)));
        }
    }
    Ok(())
}

/// `log10` of the signal; non-finite values become one decade below the smallest finite one
fn log_signal(y: &[f64]) -> Vec<f64> {
    let logs: Vec<f64> = y.iter().map(|v| v.log10()).collect();
    let floor = logs
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min);
    let fill = if floor.is_finite() { floor - 1.0 } else { -1.0 };
    logs.into_iter()
        .map(|v| if v.is_finite() { v } else { fill })
        .collect()
}

/// Run detection, review and fitting for one well
///
/// `y` is the raw signal and `shared_max` the data set maximum. `stored` is a
/// region kept from an earlier pass; it wins over the computed region when it
/// addresses the series.
pub fn analyze_well(
    well: &str,
    x: &[f64],
    y: &[f64],
    shared_max: f64,
    stored: Option<&ResponseRegion>,
    options: &AnalysisOptions,
    strategy: &mut dyn DecisionStrategy,
) -> Result<RegionOutcome, AnalysisError> {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    let ny: Vec<f64> = y.iter().map(|v| v / shared_max).collect();

    let computed = detect_region(&ny, options.derivative, options.detect_flat)?;
    let proposed = match stored {
        Some(region) if check_region(well, region, n).is_ok() => {
            tracing::debug!(well, region = %region, "using stored region");
            *region
        }
        Some(region) => {
            tracing::warn!(well, region = %region, "stored region out of bounds, recomputed");
            computed
        }
        None => computed,
    };

    let ddy = normalize_abs(&second_derivative(&ny));
    let review = RegionReview {
        well,
        x,
        y: &ny,
        ddy: &ddy,
        proposed,
    };
    let mut region = match strategy.review_region(&review) {
        RegionDecision::Accept => proposed,
        RegionDecision::Override { p1, p2 } => ResponseRegion {
            exponential: Some((p1, p2)),
            plateau: match proposed.plateau {
                Plateau::From(p3) if p3 > p2 => Plateau::From(p3),
                _ => Plateau::From(p2.saturating_add(2).min(n - 1)),
            },
        },
        RegionDecision::NoExponential => ResponseRegion {
            exponential: None,
            plateau: proposed.plateau,
        },
    };

    let review = PlateauReview {
        well,
        x,
        y: &ny,
        proposed: region,
    };
    region.plateau = match strategy.review_plateau(&review) {
        PlateauDecision::Accept => region.plateau,
        PlateauDecision::Override(p3) => Plateau::From(p3),
        PlateauDecision::UseMaximum => Plateau::Maximum,
    };
    check_region(well, &region, n)?;
    tracing::debug!(well, region = %region, "region fixed");

    let level = match region.plateau {
        Plateau::Maximum => ny.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Plateau::From(p3) if p3 == n - 1 => ny[p3],
        Plateau::From(p3) => {
            let result = fit(
                x,
                &ny,
                &Flat,
                &options.plateau.initial,
                &options.plateau.bounds,
                FitWindow::from(p3),
                &options.optimizer,
            )?;
            result.params[0]
        }
    };
    let max_signal = (level, level * shared_max);

    let (exponential, r_squared, threshold_limits) = match region.exponential {
        Some((p1, p2)) => {
            let result = fit(
                x,
                &log_signal(&ny),
                &Linear,
                &options.exponential.initial,
                &options.exponential.bounds,
                FitWindow::new(p1, p2 + 1),
                &options.optimizer,
            )?;
            let (a, b) = (result.params[0], result.params[1]);
            (
                vec![a, b, shared_max],
                Some(result.r_squared),
                (y[p1], y[p2]),
            )
        }
        None => {
            let y_min = y.iter().copied().fold(f64::INFINITY, f64::min);
            (vec![level], None, (y_min, f64::INFINITY))
        }
    };

    Ok(RegionOutcome {
        region,
        max_signal,
        exponential,
        r_squared,
        threshold_limits,
        kept: Vec::new(),
    })
}

/// Write an outcome to the well parameters and the data set side tables
///
/// Existing well parameters are replaced only when the strategy confirms. The
/// side tables then mirror whatever the well holds, so a declined replacement
/// leaves both on the earlier values. Returns the names that were kept.
pub fn record_outcome(
    well: &mut Well,
    dataset: &mut DataSet,
    outcome: &RegionOutcome,
    strategy: &mut dyn DecisionStrategy,
) -> Vec<ParameterName> {
    let max_signal = Parameter::new(
        ParameterName::MaxSignal,
        ParameterValue::Pair(outcome.max_signal.0, outcome.max_signal.1),
    )
    .with_unit(dataset.y_unit());
    let exponential = Parameter::new(
        ParameterName::ExponentialFit,
        ParameterValue::Tuple(outcome.exponential.clone()),
    );
    let limits = Parameter::new(
        ParameterName::WellThresholdLimits,
        ParameterValue::Pair(outcome.threshold_limits.0, outcome.threshold_limits.1),
    )
    .with_unit(dataset.y_unit());
    let region = Parameter::new(
        ParameterName::ResponseRegion,
        ParameterValue::Region(outcome.region),
    );

    let mut kept = Vec::new();
    for parameter in [max_signal, exponential, limits, region] {
        let name = parameter.name().clone();
        let assignment =
            well.assign_parameter_with(parameter, |old, new| strategy.confirm_replace(old, new));
        if assignment == Assignment::Kept {
            kept.push(name);
        }
    }

    for (table, name) in [
        (SideTable::MaxSignal, ParameterName::MaxSignal),
        (SideTable::Exponential, ParameterName::ExponentialFit),
        (SideTable::ThresholdLimits, ParameterName::WellThresholdLimits),
    ] {
        if let Some(parameter) = well.parameter(&name) {
            dataset.record(&table, well.id(), parameter.clone());
        }
    }

    if !kept.is_empty() {
        tracing::info!(well = well.id(), kept = ?kept, "replacement declined, earlier values kept");
    }
    kept
}

fn stored_region(well: &Well) -> Option<ResponseRegion> {
    well.parameter(&ParameterName::ResponseRegion)
        .and_then(|p| p.value().as_region())
        .copied()
}

/// Detect regions for every serie of a data set
///
/// The data set maximum is computed once before any well is processed. A
/// failing well is reported and leaves its previous parameters untouched; the
/// other wells are still processed.
///
/// # Errors
///
/// Only data set wide problems: an empty data set or a non-positive maximum.
pub fn detect_regions(
    dataset: &mut DataSet,
    wells: &mut [Well],
    options: &AnalysisOptions,
    strategy: &mut dyn DecisionStrategy,
) -> Result<BatchReport<RegionOutcome>, AnalysisError> {
    let shared_max = dataset.shared_max()?;
    if shared_max <= 0.0 {
        return Err(AnalysisError::InvalidParameter {
            param: "shared maximum".to_string(),
            value: shared_max.to_string(),
        });
    }

    let mut report = BatchReport::new();
    let series = dataset.series().to_vec();
    for serie in &series {
        let Some(well) = wells.iter_mut().find(|w| w.id() == serie.well()) else {
            report.record(
                serie.well(),
                Err(crate::data::DataError::UnknownWell(serie.well().to_string()).into()),
            );
            continue;
        };
        let stored = stored_region(well);
        let result = analyze_well(
            serie.well(),
            serie.x(),
            serie.y(),
            shared_max,
            stored.as_ref(),
            options,
            strategy,
        );
        let result = match result {
            Ok(mut outcome) => {
                outcome.kept = record_outcome(well, dataset, &outcome, strategy);
                Ok(outcome)
            }
            Err(e) => Err(e),
        };
        report.record(serie.well(), result);
    }

    tracing::info!(
        dataset = dataset.name(),
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "region detection finished"
    );
    Ok(report)
}

/// Analyse one well with an externally supplied `[p1, p2, p3]` triple
///
/// Shares every step after the review with [detect_regions], so interactive
/// and automated callers produce identical parameters.
pub fn apply_region(
    dataset: &mut DataSet,
    wells: &mut [Well],
    well: &str,
    triple: [i64; 3],
    options: &AnalysisOptions,
) -> Result<RegionOutcome, AnalysisError> {
    let shared_max = dataset.shared_max()?;
    if shared_max <= 0.0 {
        return Err(AnalysisError::InvalidParameter {
            param: "shared maximum".to_string(),
            value: shared_max.to_string(),
        });
    }
    let serie = dataset
        .serie(well)
        .cloned()
        .ok_or_else(|| crate::data::DataError::UnknownWell(well.to_string()))?;
    let target = wells
        .iter_mut()
        .find(|w| w.id() == well)
        .ok_or_else(|| crate::data::DataError::UnknownWell(well.to_string()))?;

    let mut strategy = Overrides::new().with(well, triple);
    let mut outcome = analyze_well(
        well,
        serie.x(),
        serie.y(),
        shared_max,
        None,
        options,
        &mut strategy,
    )?;
    outcome.kept = record_outcome(target, dataset, &outcome, &mut strategy);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::strategy::{AutoAccept, HumanInTheLoop};

    fn sigmoid(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1.0 / (1.0 + (-(i as f64 - 20.0) * 0.5).exp()))
            .collect()
    }

    #[test]
    fn test_second_derivative() {
        let ddy = second_derivative(&[0.0, 1.0, 4.0, 9.0]);
        assert_eq!(ddy, vec![0.5, 0.5]);
    }

    #[test]
    fn test_detect_region_ordering() {
        let y = sigmoid(40);
        for convention in [
            DerivativeConvention::Forward,
            DerivativeConvention::Central,
            DerivativeConvention::Backward,
        ] {
            let region = detect_region(&y, convention, true).unwrap();
            let (p1, p2) = region.exponential.unwrap();
            let p3 = region.plateau_start().unwrap();
            assert!(p1 <= p2 && p2 < p3 && p3 < y.len());
        }
    }

    #[test]
    fn test_convention_offsets() {
        let y = sigmoid(40);
        let forward = detect_region(&y, DerivativeConvention::Forward, true).unwrap();
        let central = detect_region(&y, DerivativeConvention::Central, true).unwrap();
        assert_eq!(central.onset().unwrap(), forward.onset().unwrap() + 1);
        assert_eq!(central.end().unwrap(), forward.end().unwrap() + 1);
    }

    #[test]
    fn test_flat_series_has_no_exponential_region() {
        let y = vec![0.5; 10];
        let region = detect_region(&y, DerivativeConvention::Forward, true).unwrap();
        assert_eq!(region.exponential, None);
        assert_eq!(region.plateau, Plateau::Maximum);

        let region = detect_region(&y, DerivativeConvention::Forward, false).unwrap();
        assert!(region.exponential.is_some());
    }

    #[test]
    fn test_short_series() {
        assert_eq!(
            detect_region(&[1.0, 2.0], DerivativeConvention::Forward, true),
            Err(AnalysisError::InsufficientData { n: 2, required: 3 })
        );
    }

    #[test]
    fn test_log_signal_fills_non_finite() {
        let logs = log_signal(&[0.0, 1.0, 10.0, -1.0]);
        assert_eq!(logs, vec![-1.0, 0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_check_region() {
        assert!(check_region("A1", &ResponseRegion::new(2, 5, 7), 8).is_ok());
        assert!(check_region("A1", &ResponseRegion::new(2, 5, 5), 8).is_err());
        assert!(check_region("A1", &ResponseRegion::new(6, 5, 7), 8).is_err());
        assert!(check_region("A1", &ResponseRegion::new(2, 5, 8), 8).is_err());
    }

    #[test]
    fn test_single_point_plateau_uses_last_value() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = vec![1.0, 1.0, 1.2, 2.0, 4.0, 7.0, 9.0, 9.8, 9.9, 10.0];
        let mut strategy = Overrides::new().with("A1", [2, 6, 9]);
        let outcome = analyze_well(
            "A1",
            &x,
            &y,
            20.0,
            None,
            &AnalysisOptions::default(),
            &mut strategy,
        )
        .unwrap();
        assert_eq!(outcome.max_signal, (0.5, 10.0));
        assert_eq!(outcome.threshold_limits, (1.2, 9.0));
        assert_eq!(outcome.exponential[2], 20.0);
    }

    #[test]
    fn test_auto_accept_runs_whole_pipeline() {
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let y: Vec<f64> = sigmoid(40).iter().map(|v| v * 1000.0).collect();
        let outcome = analyze_well(
            "A1",
            &x,
            &y,
            1000.0,
            None,
            &AnalysisOptions::default(),
            &mut AutoAccept,
        )
        .unwrap();
        assert!(outcome.exponential[0] >= 0.0);
        assert!(outcome.exponential[1] <= 0.0);
        assert!(outcome.max_signal.1 > 900.0);
    }

    #[test]
    fn test_region_override_keeps_later_plateau() {
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let y: Vec<f64> = sigmoid(40).iter().map(|v| v * 1000.0).collect();
        let proposed = detect_region(&sigmoid(40), DerivativeConvention::Forward, true)
            .unwrap()
            .plateau_start()
            .unwrap();

        let mut early = HumanInTheLoop::new(
            |_: &RegionReview<'_>| RegionDecision::Override { p1: 10, p2: 15 },
            |_: &PlateauReview<'_>| PlateauDecision::Accept,
        );
        let outcome =
            analyze_well("A1", &x, &y, 1000.0, None, &AnalysisOptions::default(), &mut early)
                .unwrap();
        assert!(proposed > 15);
        assert_eq!(outcome.region.plateau_start(), Some(proposed));

        // an override past the proposed plateau pushes it back behind p2
        let mut late = HumanInTheLoop::new(
            move |_: &RegionReview<'_>| RegionDecision::Override { p1: 10, p2: proposed + 3 },
            |_: &PlateauReview<'_>| PlateauDecision::Accept,
        );
        let outcome =
            analyze_well("A1", &x, &y, 1000.0, None, &AnalysisOptions::default(), &mut late)
                .unwrap();
        assert_eq!(outcome.region.plateau_start(), Some(proposed + 5));
    }
}
