use thiserror::Error;

/// Errors raised by the curve fitter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Not enough points in the fitting window
    #[error("Insufficient data: {n} points in window, need at least {required}")]
    InsufficientData { n: usize, required: usize },

    /// Initial guess or bounds do not match the model
    #[error("Model '{model}' takes {expected} parameters, got {found}")]
    ParameterCount {
        model: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid bounds for parameter {index}: [{lower}, {upper}]")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    /// The optimizer did not converge within its iteration budget
    #[error("Fit diverged: {reason}")]
    Divergence { reason: String },
}
