use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::data::DataError;
use crate::optimize::FitError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmplicurveError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Fit error: {0}")]
    Fit(#[from] FitError),
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}
