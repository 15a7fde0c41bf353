//! Grouping of per-well results
//!
//! Builds [GroupSerie](crate::data::GroupSerie)s from analysed wells through a
//! [Classification](crate::data::Classification), averages replicates and
//! derives the usable threshold interval of a plate.
//!
//! # Example
//!
//! ```rust,ignore
//! use amplicurve::aggregate::*;
//!
//! let clf = plate.classification("concentration").unwrap();
//! let (max, _) = max_signal_series(plate.wells(), clf, |w| w.sample().parse().ok(), "ng");
//! let (min, _) = min_signal_series(&max, plate.wells_mut(), AMPLIFICATION_READING, "ΔRn");
//! let (steps, report) = step_series(&max, &min, plate.wells_mut(), "RFU");
//! let means: Vec<MeanSerie> = steps.iter().map(|s| series_mean(s.name.clone(), [s])).collect();
//! ```

pub mod bounds;
pub mod signal;
pub mod stats;

pub use bounds::{threshold_bounds, ThresholdBounds};
pub use signal::{convert_units, max_signal_series, min_signal_series, step_series, Axis};
pub use stats::{
    group_statistics, mean_internal_replicates, replicate_statistics, series_mean, MeanPoint,
    MeanSerie,
};
