use rayon::prelude::*;

use crate::data::{DataError, DataSet, Parameter, ParameterName, ParameterValue, Well};

use super::error::AnalysisError;
use super::interpolate::{linspace, InterpolationKind, Interpolator};
use super::report::BatchReport;
use super::strategy::DecisionStrategy;
use super::types::AnalysisOptions;

/// x coordinate of the interpolated maximum of a melt curve
///
/// The interpolant is evaluated on `resample_factor * n` evenly spaced points;
/// the first grid point holding the maximum wins.
pub fn melting_peak(
    x: &[f64],
    y: &[f64],
    kind: InterpolationKind,
    resample_factor: usize,
) -> Result<f64, AnalysisError> {
    let interp = Interpolator::new(kind, x, y)?;
    let n = x.len().min(y.len());
    let grid = linspace(interp.x_min(), interp.x_max(), resample_factor.max(1) * n);
    let mut best = (grid[0], interp.eval(grid[0]));
    for xg in grid.iter().skip(1) {
        let v = interp.eval(*xg);
        if v > best.1 {
            best = (*xg, v);
        }
    }
    Ok(best.0)
}

/// Resolve and assign the `Tm` parameter of every serie of a melt data set
pub fn resolve_melting_peaks(
    dataset: &DataSet,
    wells: &mut [Well],
    options: &AnalysisOptions,
    strategy: &mut dyn DecisionStrategy,
) -> BatchReport<f64> {
    let results: Vec<Result<f64, AnalysisError>> = dataset
        .series()
        .par_iter()
        .map(|serie| {
            melting_peak(
                serie.x(),
                serie.y(),
                options.interpolation,
                options.resample_factor,
            )
        })
        .collect();

    let mut report = BatchReport::new();
    for (serie, result) in dataset.series().iter().zip(results) {
        let Some(well) = wells.iter_mut().find(|w| w.id() == serie.well()) else {
            report.record(
                serie.well(),
                Err(DataError::UnknownWell(serie.well().to_string()).into()),
            );
            continue;
        };
        if let Ok(tm) = &result {
            let parameter = Parameter::new(ParameterName::Tm, ParameterValue::Scalar(*tm))
                .with_unit(dataset.x_unit());
            well.assign_parameter_with(parameter, |old, new| strategy.confirm_replace(old, new));
        }
        report.record(serie.well(), result);
    }
    tracing::info!(
        dataset = dataset.name(),
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "melting peak resolution finished"
    );
    report
}
