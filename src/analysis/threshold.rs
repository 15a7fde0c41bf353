//! Threshold crossing (Ct / Tt) resolution
//!
//! When a well has an exponential fit `N * 10^(a*x + b)`, the crossing is the
//! exact inverse `x = (log10(thr / N) - b) / a`. Otherwise the raw series is
//! interpolated, scanned on a grid ten times denser than the series for the
//! first value above the threshold, and the bracket around that point is
//! refined. The refined crossing is the last refined sample still at or below
//! the threshold, so the reported value never overshoots.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{
    DataError, DataSet, Parameter, ParameterName, ParameterValue, ResponseRegion, SideTable, Well,
};
use crate::optimize::{ExpLinear, Invertible};

use super::error::AnalysisError;
use super::interpolate::{linspace, InterpolationKind, Interpolator};
use super::report::BatchReport;
use super::strategy::DecisionStrategy;
use super::types::AnalysisOptions;

/// How a crossing was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossingMethod {
    Model,
    Interpolation,
}

/// Resolved crossing of one well
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossing {
    pub value: f64,
    pub method: CrossingMethod,
    /// x range worth displaying around the crossing; does not affect `value`
    pub window: (f64, f64),
}

impl fmt::Display for ThresholdCrossing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let method = match self.method {
            CrossingMethod::Model => "model",
            CrossingMethod::Interpolation => "interpolation",
        };
        write!(f, "{:.4} ({})", self.value, method)
    }
}

/// Invert a stored `[a, b, N]` exponential fit at `threshold`
pub fn invert_exponential(threshold: f64, stored: &[f64]) -> Result<f64, AnalysisError> {
    let (model, params) =
        ExpLinear::from_stored(stored).ok_or_else(|| AnalysisError::InvalidParameter {
            param: "exponential fit".to_string(),
            value: format!("{:?}", stored),
        })?;
    let x = model.invert(threshold, &params);
    if x.is_finite() {
        Ok(x)
    } else {
        Err(AnalysisError::ThresholdNotReached {
            threshold,
            reason: format!("exponential model {:?} never crosses", stored),
        })
    }
}

/// Crossing of an interpolated series
///
/// Scans `resample_factor * n` evenly spaced points for the first value above
/// `threshold`, then evaluates `refine_points` points between that grid point
/// and the previous one and returns the last refined x before the first value
/// above the threshold.
pub fn crossing_by_interpolation(
    x: &[f64],
    y: &[f64],
    threshold: f64,
    kind: InterpolationKind,
    resample_factor: usize,
    refine_points: usize,
) -> Result<f64, AnalysisError> {
    let interp = Interpolator::new(kind, x, y)?;
    let n = x.len().min(y.len());
    let grid = linspace(interp.x_min(), interp.x_max(), resample_factor.max(1) * n);
    let values = interp.eval_many(&grid);

    let first = values
        .iter()
        .position(|v| *v > threshold)
        .ok_or_else(|| AnalysisError::ThresholdNotReached {
            threshold,
            reason: "signal stays at or below threshold".to_string(),
        })?;
    if first == 0 {
        return Err(AnalysisError::ThresholdNotReached {
            threshold,
            reason: "signal starts above threshold".to_string(),
        });
    }

    let fine = linspace(grid[first - 1], grid[first], refine_points.max(2));
    let above = fine
        .iter()
        .position(|xf| interp.eval(*xf) > threshold)
        .unwrap_or(fine.len());
    Ok(fine[above.max(1) - 1])
}

/// Resolve the crossing of one series
///
/// `model` is the stored exponential fit of the well; anything other than an
/// `[a, b, N]` triple selects the interpolation path. `region` only shapes the
/// display window.
pub fn resolve(
    threshold: f64,
    x: &[f64],
    y: &[f64],
    model: Option<&[f64]>,
    region: Option<&ResponseRegion>,
    options: &AnalysisOptions,
) -> Result<ThresholdCrossing, AnalysisError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(AnalysisError::InvalidParameter {
            param: "threshold".to_string(),
            value: threshold.to_string(),
        });
    }
    let n = x.len().min(y.len());
    if n == 0 {
        return Err(AnalysisError::InsufficientData { n, required: 2 });
    }

    match model.filter(|m| m.len() == 3) {
        Some(stored) => {
            let value = invert_exponential(threshold, stored)?;
            let window = match region.and_then(|r| r.exponential) {
                Some((p1, p2)) if p2 < n => {
                    let start = x[p1.saturating_sub(1)];
                    (start, value.max(x[p2]))
                }
                _ => (x[0], x[n - 1].max(value)),
            };
            Ok(ThresholdCrossing {
                value,
                method: CrossingMethod::Model,
                window,
            })
        }
        None => {
            let value = crossing_by_interpolation(
                x,
                y,
                threshold,
                options.interpolation,
                options.resample_factor,
                options.refine_points,
            )?;
            Ok(ThresholdCrossing {
                value,
                method: CrossingMethod::Interpolation,
                window: (x[0], x[n - 1]),
            })
        }
    }
}

/// Threshold of a pass: the data set threshold, else the configured one
fn pass_threshold(dataset: &DataSet, options: &AnalysisOptions) -> Result<f64, AnalysisError> {
    dataset
        .threshold()
        .or(options.threshold)
        .ok_or_else(|| AnalysisError::InvalidParameter {
            param: "threshold".to_string(),
            value: "unset".to_string(),
        })
}

/// Resolve and assign the crossing of every serie of a data set
///
/// Crossings are computed in parallel, then stored on the wells as `Ct` or
/// `Tt` parameters in serie order.
pub fn resolve_thresholds(
    dataset: &DataSet,
    wells: &mut [Well],
    options: &AnalysisOptions,
    strategy: &mut dyn DecisionStrategy,
) -> Result<BatchReport<ThresholdCrossing>, AnalysisError> {
    let threshold = pass_threshold(dataset, options)?;

    let regions: Vec<Option<ResponseRegion>> = dataset
        .series()
        .iter()
        .map(|serie| {
            wells
                .iter()
                .find(|w| w.id() == serie.well())
                .and_then(|w| w.parameter(&ParameterName::ResponseRegion))
                .and_then(|p| p.value().as_region())
                .copied()
        })
        .collect();

    let results: Vec<Result<ThresholdCrossing, AnalysisError>> = dataset
        .series()
        .par_iter()
        .zip(regions.par_iter())
        .map(|(serie, region)| {
            let model = dataset
                .lookup(&SideTable::Exponential, serie.well())
                .and_then(|p| p.value().as_tuple());
            resolve(
                threshold,
                serie.x(),
                serie.y(),
                model,
                region.as_ref(),
                options,
            )
        })
        .collect();

    let name = options.crossing.parameter_name();
    let mut report = BatchReport::new();
    for (serie, result) in dataset.series().iter().zip(results) {
        let Some(well) = wells.iter_mut().find(|w| w.id() == serie.well()) else {
            report.record(
                serie.well(),
                Err(DataError::UnknownWell(serie.well().to_string()).into()),
            );
            continue;
        };
        if let Ok(crossing) = &result {
            let parameter = Parameter::new(name.clone(), ParameterValue::Scalar(crossing.value))
                .with_unit(dataset.x_unit());
            well.assign_parameter_with(parameter, |old, new| strategy.confirm_replace(old, new));
        }
        report.record(serie.well(), result);
    }

    tracing::info!(
        dataset = dataset.name(),
        threshold,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "threshold resolution finished"
    );
    Ok(report)
}
