//! Standard curves relating concentration to threshold values
//!
//! Standards of known concentration `c` give threshold values `t` that follow
//! `t = a * c^-b + k`. Once fitted, the curve is inverted to estimate the
//! concentration of the other wells: `c = (a / (t - k))^(1 / b)`.

use crate::data::{Parameter, ParameterName, ParameterValue, Well};
use crate::optimize::{fit, FitWindow, Invertible, Model, Reciprocal};

use super::error::AnalysisError;
use super::report::BatchReport;
use super::strategy::DecisionStrategy;
use super::types::AnalysisOptions;

/// Fitted reciprocal standard curve
#[derive(Debug, Clone, PartialEq)]
pub struct StandardCurve {
    /// `[a, b, k]`
    pub params: Vec<f64>,
    pub r_squared: f64,
    /// `(concentration, threshold value)` of the standards
    pub points: Vec<(f64, f64)>,
}

impl StandardCurve {
    /// Fit the curve to `(concentration, threshold value)` points
    pub fn fit(points: &[(f64, f64)], options: &AnalysisOptions) -> Result<Self, AnalysisError> {
        let (x, y): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        let result = fit(
            &x,
            &y,
            &Reciprocal,
            &options.concentration.initial,
            &options.concentration.bounds,
            FitWindow::full(),
            &options.optimizer,
        )?;
        tracing::debug!(r_squared = result.r_squared, "standard curve {:?}", result.params);
        Ok(StandardCurve {
            params: result.params,
            r_squared: result.r_squared,
            points: points.to_vec(),
        })
    }

    /// Threshold value expected at a concentration
    pub fn threshold_at(&self, concentration: f64) -> f64 {
        Reciprocal.eval(concentration, &self.params)
    }

    /// Concentration producing a threshold value
    pub fn concentration(&self, threshold_value: f64) -> Result<f64, AnalysisError> {
        let c = Reciprocal.invert(threshold_value, &self.params);
        if threshold_value > self.params[2] && c.is_finite() && c > 0.0 {
            Ok(c)
        } else {
            Err(AnalysisError::InvalidParameter {
                param: "threshold value".to_string(),
                value: format!("{} outside the standard curve", threshold_value),
            })
        }
    }
}

fn crossing_value(well: &Well, label: &ParameterName) -> Result<f64, AnalysisError> {
    well.parameter(label)
        .and_then(|p| p.value().as_scalar())
        .ok_or_else(|| AnalysisError::MissingParameter {
            well: well.id().to_string(),
            parameter: label.to_string(),
        })
}

/// Fit a standard curve from wells of known concentration
///
/// `known` returns the concentration of a standard well and `None` for every
/// other well. Standards without the `label` crossing parameter are left out of
/// the fit and reported; the report lists the `(concentration, threshold value)`
/// of the others.
///
/// # Errors
///
/// [AnalysisError::InsufficientData] when fewer standards remain than the
/// curve has parameters, or the fit failure.
pub fn fit_standard_curve<F>(
    wells: &[Well],
    known: F,
    label: &ParameterName,
    options: &AnalysisOptions,
) -> Result<(StandardCurve, BatchReport<(f64, f64)>), AnalysisError>
where
    F: Fn(&Well) -> Option<f64>,
{
    let mut report = BatchReport::new();
    for well in wells {
        if let Some(c) = known(well) {
            report.record(well.id(), crossing_value(well, label).map(|t| (c, t)));
        }
    }
    let points: Vec<(f64, f64)> = report.succeeded.iter().map(|(_, point)| *point).collect();
    let required = Reciprocal.n_params();
    if points.len() < required {
        return Err(AnalysisError::InsufficientData {
            n: points.len(),
            required,
        });
    }
    let curve = StandardCurve::fit(&points, options)?;
    Ok((curve, report))
}

/// Estimate and assign the concentration of the selected wells
pub fn estimate_concentrations(
    wells: &mut [Well],
    selection: &[&str],
    curve: &StandardCurve,
    label: &ParameterName,
    unit: &str,
    strategy: &mut dyn DecisionStrategy,
) -> BatchReport<f64> {
    let mut report = BatchReport::new();
    for id in selection {
        let Some(well) = wells.iter_mut().find(|w| w.id() == *id) else {
            report.record(
                *id,
                Err(crate::data::DataError::UnknownWell(id.to_string()).into()),
            );
            continue;
        };
        let result = crossing_value(well, label).and_then(|t| curve.concentration(t));
        if let Ok(c) = &result {
            let parameter = Parameter::new(ParameterName::Concentration, ParameterValue::Scalar(*c))
                .with_unit(unit);
            well.assign_parameter_with(parameter, |old, new| strategy.confirm_replace(old, new));
        }
        report.record(*id, result);
    }
    report
}
