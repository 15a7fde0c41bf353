//! Analysis error types

use thiserror::Error;

use crate::data::DataError;
use crate::optimize::FitError;

/// Per-well failures of the analysis engine
///
/// A missing exponential region is not an error: it switches threshold
/// resolution to the interpolation path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Fewer points than a derivative or fit window needs
    #[error("Insufficient data: {n} points, need at least {required}")]
    InsufficientData { n: usize, required: usize },

    /// The optimizer failed to converge within bounds
    #[error("Fit divergence: {reason}")]
    FitDivergence { reason: String },

    /// Neither the model inverse nor the interpolation scan crosses the threshold
    #[error("Threshold {threshold} not reached: {reason}")]
    ThresholdNotReached { threshold: f64, reason: String },

    /// A paired computation lacks the counterpart of a well
    #[error("Well '{well}' has no counterpart in data set '{dataset}'")]
    MissingPairedData { well: String, dataset: String },

    /// Region indices that do not address the series
    #[error("Invalid region for well '{well}': {reason}")]
    InvalidRegion { well: String, reason: String },

    /// A parameter needed by this step has not been computed
    #[error("Well '{well}' has no '{parameter}' parameter")]
    MissingParameter { well: String, parameter: String },

    /// Invalid parameter value
    #[error("Invalid parameter: {param} = {value}")]
    InvalidParameter { param: String, value: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<FitError> for AnalysisError {
    fn from(error: FitError) -> Self {
        match error {
            FitError::InsufficientData { n, required } => {
                AnalysisError::InsufficientData { n, required }
            }
            other => AnalysisError::FitDivergence {
                reason: other.to_string(),
            },
        }
    }
}
