//! Plate data model
//!
//! | Type | Holds |
//! |------|-------|
//! | [WellSet] | wells, data sets and classifications of one plate |
//! | [Well] | readings and derived parameters of one sample location |
//! | [Reading] | equal-length labelled columns recorded together |
//! | [Parameter] | a named derived value, unique per name on its owner |
//! | [DataSet] | curves sharing axis semantics, plus per-well side tables |
//! | [Classification] | groups of wells by category value |

pub mod builder;
pub mod classification;
pub mod dataset;
pub mod error;
pub mod parameter;
pub mod reading;
pub mod structs;

pub use builder::WellBuilder;
pub use classification::{Category, Classification};
pub use dataset::{DataSerie, DataSet, GroupSerie, SeriesSource, SideTable};
pub use error::DataError;
pub use parameter::{Assignment, Parameter, ParameterName, ParameterValue, Plateau, ResponseRegion};
pub use reading::{Column, Reading};
pub use structs::{Well, WellSet};

/// Default name of the reading holding amplification curves
pub const AMPLIFICATION_READING: &str = "Amplification data";
