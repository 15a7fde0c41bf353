//! Signal amplitude series grouped by classification
//!
//! `max_signal_series` builds one [GroupSerie] per category from the plateau
//! levels found by region detection. `min_signal_series` reuses those series
//! as templates and reads the signal at each well's exponential onset, and
//! `step_series` subtracts the two per well.

use crate::analysis::{AnalysisError, BatchReport};
use crate::data::{
    Classification, DataError, GroupSerie, Parameter, ParameterName, ParameterValue, Well,
};

/// Axis of a serie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

fn missing(well: &str, parameter: ParameterName) -> AnalysisError {
    AnalysisError::MissingParameter {
        well: well.to_string(),
        parameter: parameter.to_string(),
    }
}

/// Normalised plateau level of every classified well
///
/// `x` gives the abscissa of a well, typically a concentration; wells without
/// one, or classified wells missing from `wells`, are reported and left out of
/// the series. Wells lacking a `max signal`
/// parameter stay in the series with a missing value. The serie norm is the
/// ratio of raw to normalised level, shared by all wells of a data set.
pub fn max_signal_series<F>(
    wells: &[Well],
    classification: &Classification,
    x: F,
    x_unit: &str,
) -> (Vec<GroupSerie>, BatchReport<f64>)
where
    F: Fn(&Well) -> Option<f64>,
{
    let mut series = Vec::new();
    let mut report = BatchReport::new();

    for category in classification.groups() {
        let mut serie = GroupSerie::new(category.value());
        serie.x_unit = x_unit.to_string();
        let mut norms: Vec<f64> = Vec::new();

        for id in category.wells() {
            let Some(well) = wells.iter().find(|w| w.id() == id) else {
                report.push_err(id.clone(), DataError::UnknownWell(id.clone()).into());
                continue;
            };
            let Some(xi) = x(well) else {
                report.push_err(
                    id.clone(),
                    AnalysisError::InvalidParameter {
                        param: "x".to_string(),
                        value: format!("none for well {}", id),
                    },
                );
                continue;
            };
            let level = well
                .parameter(&ParameterName::MaxSignal)
                .and_then(|p| p.value().as_pair())
                .ok_or_else(|| missing(id, ParameterName::MaxSignal));
            match level {
                Ok((normalised, raw)) => {
                    if normalised != 0.0 {
                        norms.push(raw / normalised);
                    }
                    if serie.y_unit.is_empty() {
                        if let Some(p) = well.parameter(&ParameterName::MaxSignal) {
                            serie.y_unit = p.unit().to_string();
                        }
                    }
                    serie.push(id.clone(), xi, Some(normalised));
                    report.push_ok(id.clone(), normalised);
                }
                Err(e) => {
                    serie.push(id.clone(), xi, None);
                    report.record(id.clone(), Err(e));
                }
            }
        }

        if serie.is_empty() {
            continue;
        }
        serie.norm = common_norm(&norms);
        if serie.norm.is_none() && !norms.is_empty() {
            tracing::warn!(serie = serie.name.as_str(), "wells do not share a normalisation");
        }
        series.push(serie);
    }
    (series, report)
}

/// The norm shared by all values, up to rounding
fn common_norm(norms: &[f64]) -> Option<f64> {
    let first = *norms.first()?;
    norms
        .iter()
        .all(|n| (n - first).abs() <= 1e-9 * first.abs().max(1.0))
        .then_some(first)
}

/// Signal at the exponential onset of every well of the template series
///
/// The value is read from `column` of `reading` at the `p1` index of the
/// well's response region and divided by the template norm. Each resolved
/// well gets a `min step signal` parameter `(normalised, raw)`.
pub fn min_signal_series(
    templates: &[GroupSerie],
    wells: &mut [Well],
    reading: &str,
    column: &str,
) -> (Vec<GroupSerie>, BatchReport<f64>) {
    let mut series = Vec::with_capacity(templates.len());
    let mut report = BatchReport::new();

    for template in templates {
        let mut serie = GroupSerie::new(template.name.clone());
        serie.x_unit = template.x_unit.clone();
        serie.norm = template.norm;

        for (id, xi) in template.wells.iter().zip(template.x.iter()) {
            let result = wells
                .iter_mut()
                .find(|w| w.id() == id)
                .ok_or_else(|| AnalysisError::from(DataError::UnknownWell(id.clone())))
                .and_then(|well| {
                    let (raw, unit) = onset_signal(well, reading, column)?;
                    let norm = template.norm.ok_or_else(|| AnalysisError::InvalidParameter {
                        param: "normalisation".to_string(),
                        value: format!("none for serie {}", template.name),
                    })?;
                    let normalised = raw / norm;
                    well.assign_parameter(
                        Parameter::new(
                            ParameterName::MinStepSignal,
                            ParameterValue::Pair(normalised, raw),
                        )
                        .with_unit(unit),
                    );
                    Ok(normalised)
                });
            serie.push(id.clone(), *xi, result.as_ref().ok().copied());
            if serie.y_unit.is_empty() {
                serie.y_unit = template.y_unit.clone();
            }
            report.record(id.clone(), result);
        }
        series.push(serie);
    }
    (series, report)
}

fn onset_signal(well: &Well, reading: &str, column: &str) -> Result<(f64, String), AnalysisError> {
    let onset = well
        .parameter(&ParameterName::ResponseRegion)
        .and_then(|p| p.value().as_region())
        .ok_or_else(|| missing(well.id(), ParameterName::ResponseRegion))?
        .onset()
        .ok_or_else(|| AnalysisError::InvalidRegion {
            well: well.id().to_string(),
            reason: "no exponential region".to_string(),
        })?;
    let reading = well.require_reading(reading)?;
    let col = reading
        .column(column)
        .ok_or_else(|| DataError::UnknownColumn {
            reading: reading.name().to_string(),
            label: column.to_string(),
        })?;
    let value = col
        .values()
        .get(onset)
        .copied()
        .ok_or_else(|| AnalysisError::InvalidRegion {
            well: well.id().to_string(),
            reason: format!("onset {} outside {} values", onset, col.len()),
        })?;
    Ok((value, col.unit().to_string()))
}

/// Difference between maximum and minimum signal series, paired by well
///
/// Series are matched by name and wells by id. A well present on one side only
/// keeps a missing value and is reported as [AnalysisError::MissingPairedData].
/// Minimum series and wells without a maximum counterpart are appended after
/// the paired ones.
/// Each resolved well gets a `step signal` parameter: `(step, step * norm)`
/// when the maximum serie has a norm, the bare step otherwise.
pub fn step_series(
    max: &[GroupSerie],
    min: &[GroupSerie],
    wells: &mut [Well],
    unit: &str,
) -> (Vec<GroupSerie>, BatchReport<f64>) {
    let mut series = Vec::with_capacity(max.len());
    let mut report = BatchReport::new();

    for max_serie in max {
        let min_serie = min.iter().find(|s| s.name == max_serie.name);
        let mut serie = GroupSerie::new(max_serie.name.clone());
        serie.x_unit = max_serie.x_unit.clone();
        serie.y_unit = max_serie.y_unit.clone();
        serie.norm = max_serie.norm;

        for (i, (id, xi)) in max_serie.wells.iter().zip(max_serie.x.iter()).enumerate() {
            let upper = max_serie.y.get(i).copied().flatten();
            let lower = min_serie.and_then(|s| {
                s.wells
                    .iter()
                    .position(|w| w == id)
                    .and_then(|j| s.y.get(j).copied().flatten())
            });
            let step = match (upper, lower) {
                (Some(upper), Some(lower)) => Ok(upper - lower),
                (None, _) => Err(AnalysisError::MissingPairedData {
                    well: id.clone(),
                    dataset: "max signal".to_string(),
                }),
                (_, None) => Err(AnalysisError::MissingPairedData {
                    well: id.clone(),
                    dataset: "min signal".to_string(),
                }),
            };
            if let (Ok(step), Some(well)) = (&step, wells.iter_mut().find(|w| w.id() == id)) {
                let value = match max_serie.norm {
                    Some(norm) => ParameterValue::Pair(*step, step * norm),
                    None => ParameterValue::Scalar(*step),
                };
                well.assign_parameter(
                    Parameter::new(ParameterName::StepSignal, value).with_unit(unit),
                );
            }
            serie.push(id.clone(), *xi, step.as_ref().ok().copied());
            report.record(id.clone(), step);
        }
        series.push(serie);
    }

    for min_serie in min {
        let paired = max.iter().find(|s| s.name == min_serie.name);
        let unmatched: Vec<(&String, f64)> = min_serie
            .wells
            .iter()
            .zip(min_serie.x.iter())
            .filter(|(id, _)| paired.map_or(true, |s| !s.wells.contains(*id)))
            .map(|(id, xi)| (id, *xi))
            .collect();
        if unmatched.is_empty() {
            continue;
        }
        let index = match series.iter().position(|s| s.name == min_serie.name) {
            Some(index) => index,
            None => {
                let mut serie = GroupSerie::new(min_serie.name.clone());
                serie.x_unit = min_serie.x_unit.clone();
                series.push(serie);
                series.len() - 1
            }
        };
        for (id, xi) in unmatched {
            series[index].push(id.clone(), xi, None);
            report.push_err(
                id.clone(),
                AnalysisError::MissingPairedData {
                    well: id.clone(),
                    dataset: "max signal".to_string(),
                },
            );
        }
    }
    (series, report)
}

/// Scale one axis of every serie and relabel its unit
pub fn convert_units(series: &mut [GroupSerie], axis: Axis, factor: f64, unit: &str) {
    for serie in series.iter_mut() {
        match axis {
            Axis::X => {
                serie.x.iter_mut().for_each(|x| *x *= factor);
                serie.x_unit = unit.to_string();
            }
            Axis::Y => {
                serie.y.iter_mut().flatten().for_each(|y| *y *= factor);
                serie.y_unit = unit.to_string();
            }
        }
    }
}
