//! Amplification curve analysis
//!
//! # Pipeline
//!
//! | Step | Function | Writes |
//! |------|----------|--------|
//! | Region detection | [detect_regions] | `Amplification response region`, `max signal`, `exponential fit`, `well threshold limits` |
//! | Threshold crossing | [resolve_thresholds] | `Ct` or `Tt` |
//! | Melting peak | [resolve_melting_peaks] | `Tm` |
//! | Standard curve | [fit_standard_curve], [estimate_concentrations] | `concentration` |
//!
//! Every pass returns a [BatchReport]: a failing well is listed with its
//! reason and never stops the other wells.
//!
//! # Usage
//!
//! ```rust,ignore
//! use amplicurve::prelude::*;
//!
//! let mut plate = WellSet::new("run 1", wells);
//! let source = SeriesSource::new(AMPLIFICATION_READING, "Cycle", "ΔRn");
//! let dataset = DataSet::from_wells("amplification", plate.wells(), &source)?;
//! plate.assign_dataset(dataset);
//!
//! let options = AnalysisOptions::default().with_threshold(0.2);
//! let summary = plate.analyze_amplification("amplification", &options, &mut AutoAccept)?;
//! println!("{}", summary);
//! ```
//!
//! Region boundaries can be corrected by supplying an [Overrides] strategy,
//! or by calling [apply_region] for a single well. Corrections are stored on
//! the well and reused by later passes.

mod analyze;
pub mod concentration;
mod error;
pub mod interpolate;
pub mod melt;
pub mod region;
mod report;
pub mod strategy;
pub mod threshold;
mod types;


pub use analyze::AmplificationSummary;
pub use concentration::{estimate_concentrations, fit_standard_curve, StandardCurve};
pub use error::AnalysisError;
pub use interpolate::{linspace, InterpolationKind, Interpolator};
pub use melt::{melting_peak, resolve_melting_peaks};
pub use region::{
    analyze_well, apply_region, detect_region, detect_regions, record_outcome, second_derivative,
    RegionOutcome,
};
pub use report::{BatchReport, WellFailure};
pub use strategy::{
    AutoAccept, DecisionStrategy, HumanInTheLoop, Overrides, PlateauDecision, PlateauReview,
    RegionDecision, RegionReview,
};
pub use threshold::{
    crossing_by_interpolation, invert_exponential, resolve, resolve_thresholds, CrossingMethod,
    ThresholdCrossing,
};
pub use types::{AnalysisOptions, CrossingLabel, DerivativeConvention, FitSpec};
