pub mod aggregate;
pub mod analysis;
pub mod data;
pub mod error;
pub mod optimize;

pub use crate::data::*;
pub use error::AmplicurveError;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            Classification, DataSet, GroupSerie, Parameter, ParameterName, ParameterValue,
            Reading, ResponseRegion, SeriesSource, Well, WellSet,
        };
    }
    pub mod analysis {
        pub use crate::analysis::{
            apply_region, detect_regions, estimate_concentrations, fit_standard_curve,
            resolve_melting_peaks, resolve_thresholds, AnalysisOptions, AutoAccept, BatchReport,
            DecisionStrategy, HumanInTheLoop, Overrides,
        };
    }
    pub mod aggregate {
        pub use crate::aggregate::{
            max_signal_series, min_signal_series, series_mean, step_series, threshold_bounds,
        };
    }

    pub use crate::analysis::{
        AnalysisError, AnalysisOptions, AutoAccept, CrossingLabel, DecisionStrategy,
        DerivativeConvention, InterpolationKind, Overrides,
    };
    pub use crate::data::*;
    pub use crate::error::AmplicurveError;
}
