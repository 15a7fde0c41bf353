//! Replicate statistics over grouped series
//!
//! Replicates are points sharing the exact same x value. Missing y values are
//! excluded from every statistic and only reduce the count `n`.

use serde::{Deserialize, Serialize};

use crate::data::{DataError, GroupSerie};

// ============================================================================
// Types
// ============================================================================

/// Statistics of the y values found at one x
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanPoint {
    pub x: f64,
    /// Number of present values
    pub n: usize,
    /// `None` when every value at this x is missing
    pub mean: Option<f64>,
    /// Population standard deviation
    pub std: Option<f64>,
    /// `std / sqrt(n)`; zero for a single value
    pub sem: Option<f64>,
}

/// Mean curve over one or more series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanSerie {
    pub name: String,
    /// Names of the series that were averaged
    pub sources: Vec<String>,
    /// Every well contributing to the mean
    pub wells: Vec<String>,
    pub points: Vec<MeanPoint>,
    pub x_unit: String,
}

impl MeanSerie {
    pub fn x(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn means(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.mean).collect()
    }

    pub fn point(&self, x: f64) -> Option<&MeanPoint> {
        self.points.iter().find(|p| p.x == x)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Group values by identical x, in order of first appearance
pub fn replicate_statistics(x: &[f64], y: &[Option<f64>]) -> Vec<MeanPoint> {
    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for (xi, yi) in x.iter().zip(y.iter()) {
        let idx = match groups.iter().position(|(gx, _)| gx == xi) {
            Some(idx) => idx,
            None => {
                groups.push((*xi, Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(v) = yi.filter(|v| !v.is_nan()) {
            groups[idx].1.push(v);
        }
    }
    groups
        .into_iter()
        .map(|(x, values)| point_statistics(x, &values))
        .collect()
}

fn point_statistics(x: f64, values: &[f64]) -> MeanPoint {
    let n = values.len();
    if n == 0 {
        return MeanPoint {
            x,
            n,
            mean: None,
            std: None,
            sem: None,
        };
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std = variance.sqrt();
    MeanPoint {
        x,
        n,
        mean: Some(mean),
        std: Some(std),
        sem: Some(std / (n as f64).sqrt()),
    }
}

/// Mean of several series, pooled by identical x
pub fn series_mean<'a, I>(name: impl Into<String>, series: I) -> MeanSerie
where
    I: IntoIterator<Item = &'a GroupSerie>,
{
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut sources = Vec::new();
    let mut wells = Vec::new();
    let mut x_unit = String::new();
    for serie in series {
        x.extend_from_slice(&serie.x);
        y.extend_from_slice(&serie.y);
        wells.extend(serie.wells.iter().cloned());
        sources.push(serie.name.clone());
        if x_unit.is_empty() {
            x_unit = serie.x_unit.clone();
        }
    }
    MeanSerie {
        name: name.into(),
        sources,
        wells,
        points: replicate_statistics(&x, &y),
        x_unit,
    }
}

/// Collapse the internal replicates of a serie into their mean
///
/// The returned serie has one point per distinct x. Its `wells` keeps every
/// well of the input.
pub fn mean_internal_replicates(serie: &GroupSerie) -> GroupSerie {
    let points = replicate_statistics(&serie.x, &serie.y);
    GroupSerie {
        name: serie.name.clone(),
        wells: serie.wells.clone(),
        x: points.iter().map(|p| p.x).collect(),
        y: points.iter().map(|p| p.mean).collect(),
        norm: serie.norm,
        x_unit: serie.x_unit.clone(),
        y_unit: serie.y_unit.clone(),
    }
}

/// Mean curves of groups of series
///
/// Internal replicates of every serie are averaged first; each group then
/// pools the replicate means of its member series. Groups are named series
/// lists, in output order.
pub fn group_statistics(
    series: &[GroupSerie],
    groups: &[(String, Vec<String>)],
) -> Result<Vec<MeanSerie>, DataError> {
    let collapsed: Vec<GroupSerie> = series.iter().map(mean_internal_replicates).collect();
    groups
        .iter()
        .map(|(group, members)| {
            let selected = members
                .iter()
                .map(|member| {
                    collapsed
                        .iter()
                        .find(|s| &s.name == member)
                        .ok_or_else(|| DataError::UnknownSerie(member.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(group = group.as_str(), n = selected.len(), "group mean");
            Ok(series_mean(group.clone(), selected))
        })
        .collect()
}
