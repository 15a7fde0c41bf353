use std::fmt;

use crate::data::WellSet;

use super::error::AnalysisError;
use super::region::{detect_regions, RegionOutcome};
use super::report::BatchReport;
use super::strategy::DecisionStrategy;
use super::threshold::{resolve_thresholds, ThresholdCrossing};
use super::types::AnalysisOptions;

/// Reports of a full amplification pass over one data set
#[derive(Debug, Clone)]
pub struct AmplificationSummary {
    pub regions: BatchReport<RegionOutcome>,
    /// `None` when neither the data set nor the options define a threshold
    pub crossings: Option<BatchReport<ThresholdCrossing>>,
}

impl fmt::Display for AmplificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Regions: {} succeeded, {} failed",
            self.regions.succeeded.len(),
            self.regions.failed.len()
        )?;
        for failure in &self.regions.failed {
            writeln!(f, "  {}", failure)?;
        }
        match &self.crossings {
            Some(crossings) => write!(f, "Crossings: {}", crossings),
            None => writeln!(f, "Crossings: no threshold set"),
        }
    }
}

impl WellSet {
    /// Region detection followed by threshold resolution on a data set
    ///
    /// Wells failing region detection fall back to interpolation when their
    /// crossing is resolved, because they carry no exponential fit.
    pub fn analyze_amplification(
        &mut self,
        dataset: &str,
        options: &AnalysisOptions,
        strategy: &mut dyn DecisionStrategy,
    ) -> Result<AmplificationSummary, AnalysisError> {
        let (data, wells) = self.dataset_and_wells_mut(dataset)?;
        let regions = detect_regions(data, wells, options, strategy)?;
        let crossings = if data.threshold().or(options.threshold).is_some() {
            Some(resolve_thresholds(data, wells, options, strategy)?)
        } else {
            tracing::info!(dataset, "no threshold set, skipping crossings");
            None
        };
        Ok(AmplificationSummary { regions, crossings })
    }
}
