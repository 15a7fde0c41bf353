//! Analysis configuration

use serde::{Deserialize, Serialize};

use super::interpolate::InterpolationKind;
use crate::data::ParameterName;
use crate::optimize::{Bounds, FitOptions, ParamBound};

/// Finite-difference convention used to align the second derivative with the signal
///
/// The discrete second derivative is two samples shorter than the signal.
/// The convention selects how its indices map back onto signal indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DerivativeConvention {
    /// `ddy[i]` belongs to `y[i]`
    #[default]
    Forward,
    /// `ddy[i]` belongs to `y[i + 1]`
    Central,
    /// `ddy[i]` belongs to `y[i + 2]`
    Backward,
}

impl DerivativeConvention {
    pub fn offset(&self) -> usize {
        match self {
            DerivativeConvention::Forward => 0,
            DerivativeConvention::Central => 1,
            DerivativeConvention::Backward => 2,
        }
    }
}

/// Name under which a threshold crossing is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CrossingLabel {
    /// Cycle threshold
    #[default]
    Ct,
    /// Time threshold
    Tt,
}

impl CrossingLabel {
    pub fn parameter_name(&self) -> ParameterName {
        match self {
            CrossingLabel::Ct => ParameterName::Ct,
            CrossingLabel::Tt => ParameterName::Tt,
        }
    }
}

/// Initial guess and bounds of one fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSpec {
    pub initial: Vec<f64>,
    pub bounds: Bounds,
}

impl FitSpec {
    pub fn new(initial: Vec<f64>, bounds: Bounds) -> Self {
        FitSpec { initial, bounds }
    }
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Index alignment of the second derivative (default: Forward)
    pub derivative: DerivativeConvention,

    /// Interpolant of the fallback threshold path and of Tm (default: Quadratic)
    pub interpolation: InterpolationKind,

    /// Linear fit of `log10(y / N)` over the exponential region
    ///
    /// Default start `[0.5, -2]`, with `a ≥ 0` and `b ≤ 0`.
    pub exponential: FitSpec,

    /// Flat fit of the normalised plateau (default start 0.5, at most 1.5)
    pub plateau: FitSpec,

    /// Reciprocal standard curve `a * x^-b + c` used for concentrations
    pub concentration: FitSpec,

    pub optimizer: FitOptions,

    /// Threshold used when a data set carries none
    pub threshold: Option<f64>,

    /// Ct for cycle axes, Tt for time axes
    pub crossing: CrossingLabel,

    /// Treat series without positive curvature as having no exponential region
    pub detect_flat: bool,

    /// Density of the interpolation scan relative to the series length (default: 10)
    pub resample_factor: usize,

    /// Points used to refine a threshold bracket (default: 1000)
    pub refine_points: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            derivative: DerivativeConvention::Forward,
            interpolation: InterpolationKind::Quadratic,
            exponential: FitSpec::new(
                vec![0.5, -2.0],
                Bounds::new(vec![ParamBound::at_least(0.0), ParamBound::at_most(0.0)]),
            ),
            plateau: FitSpec::new(vec![0.5], Bounds::new(vec![ParamBound::at_most(1.5)])),
            concentration: FitSpec::new(
                vec![1.0, 2.0, 0.0],
                Bounds::new(vec![
                    ParamBound::at_least(0.0),
                    ParamBound::at_least(0.1),
                    ParamBound::at_least(0.0),
                ]),
            ),
            optimizer: FitOptions::default(),
            threshold: None,
            crossing: CrossingLabel::Ct,
            detect_flat: true,
            resample_factor: 10,
            refine_points: 1000,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from JSON; missing fields are an error
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_derivative(mut self, derivative: DerivativeConvention) -> Self {
        self.derivative = derivative;
        self
    }

    pub fn with_interpolation(mut self, kind: InterpolationKind) -> Self {
        self.interpolation = kind;
        self
    }

    pub fn with_exponential(mut self, spec: FitSpec) -> Self {
        self.exponential = spec;
        self
    }

    pub fn with_plateau(mut self, spec: FitSpec) -> Self {
        self.plateau = spec;
        self
    }

    pub fn with_concentration(mut self, spec: FitSpec) -> Self {
        self.concentration = spec;
        self
    }

    pub fn with_optimizer(mut self, optimizer: FitOptions) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_crossing(mut self, crossing: CrossingLabel) -> Self {
        self.crossing = crossing;
        self
    }

    pub fn with_detect_flat(mut self, detect_flat: bool) -> Self {
        self.detect_flat = detect_flat;
        self
    }

    pub fn with_resample_factor(mut self, factor: usize) -> Self {
        self.resample_factor = factor.max(1);
        self
    }

    pub fn with_refine_points(mut self, points: usize) -> Self {
        self.refine_points = points.max(2);
        self
    }
}
