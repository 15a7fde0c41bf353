//! Errors raised by the data model

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// A column does not match the length of the other columns of its reading
    #[error("Column '{label}' in reading '{reading}' has {found} values, expected {expected}")]
    LengthMismatch {
        reading: String,
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("Well '{0}' not found")]
    UnknownWell(String),

    #[error("Well '{well}' has no reading named '{reading}'")]
    UnknownReading { well: String, reading: String },

    #[error("Reading '{reading}' has no column labelled '{label}'")]
    UnknownColumn { reading: String, label: String },

    #[error("Data set '{0}' not found")]
    UnknownDataSet(String),

    #[error("No serie named '{0}'")]
    UnknownSerie(String),

    #[error("Data set '{0}' contains no series")]
    EmptyDataSet(String),
}
