use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::classification::Classification;
use super::dataset::DataSet;
use super::error::DataError;
use super::parameter::{assign_by_name, Assignment, Parameter, ParameterName};
use super::reading::Reading;

/// A plate: the collection of wells analysed together
///
/// [WellSet] owns the [Well]s, the [DataSet]s derived from them and the
/// [Classification]s used to group them. Data sets refer to wells by id only.
///
/// # Examples
///
/// ```
/// use amplicurve::prelude::*;
///
/// let a1 = Well::builder("A1")
///     .sample("standard 1")
///     .amplification("Cycle", &[1.0, 2.0, 3.0], "ΔRn", &[0.1, 0.2, 0.4])
///     .build();
/// let a2 = Well::builder("A2").sample("NTC").build();
///
/// let mut plate = WellSet::new("run 1", vec![a1]);
/// plate.add_well(a2);
/// assert_eq!(plate.len(), 2);
/// assert!(plate.well("A2").is_some());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WellSet {
    name: String,
    wells: Vec<Well>,
    datasets: Vec<DataSet>,
    classifications: Vec<Classification>,
}

impl WellSet {
    pub fn new(name: impl Into<String>, wells: Vec<Well>) -> Self {
        WellSet {
            name: name.into(),
            wells,
            datasets: Vec::new(),
            classifications: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    pub fn wells_mut(&mut self) -> &mut [Well] {
        &mut self.wells
    }

    /// Add a well, replacing any well with the same id
    pub fn add_well(&mut self, well: Well) {
        match self.wells.iter_mut().find(|w| w.id() == well.id()) {
            Some(existing) => *existing = well,
            None => self.wells.push(well),
        }
    }

    pub fn well(&self, id: &str) -> Option<&Well> {
        self.wells.iter().find(|well| well.id() == id)
    }

    pub fn well_mut(&mut self, id: &str) -> Option<&mut Well> {
        self.wells.iter_mut().find(|well| well.id() == id)
    }

    pub fn datasets(&self) -> &[DataSet] {
        &self.datasets
    }

    pub fn dataset(&self, name: &str) -> Option<&DataSet> {
        self.datasets.iter().find(|d| d.name() == name)
    }

    pub fn dataset_mut(&mut self, name: &str) -> Option<&mut DataSet> {
        self.datasets.iter_mut().find(|d| d.name() == name)
    }

    /// Attach a data set, replacing any data set with the same name
    pub fn assign_dataset(&mut self, dataset: DataSet) -> Assignment {
        self.assign_dataset_with(dataset, |_, _| true)
    }

    /// Attach a data set, asking `confirm` before replacing one with the same name
    pub fn assign_dataset_with<F>(&mut self, dataset: DataSet, confirm: F) -> Assignment
    where
        F: FnOnce(&DataSet, &DataSet) -> bool,
    {
        match self.datasets.iter_mut().find(|d| d.name() == dataset.name()) {
            Some(existing) => {
                if confirm(existing, &dataset) {
                    *existing = dataset;
                    Assignment::Replaced
                } else {
                    Assignment::Kept
                }
            }
            None => {
                self.datasets.push(dataset);
                Assignment::Appended
            }
        }
    }

    /// Split borrow of a data set and the wells it refers to
    ///
    /// Analysis passes update the data set side tables and the well
    /// parameters in the same sweep.
    pub fn dataset_and_wells_mut(
        &mut self,
        name: &str,
    ) -> Result<(&mut DataSet, &mut [Well]), DataError> {
        let dataset = self
            .datasets
            .iter_mut()
            .find(|d| d.name() == name)
            .ok_or_else(|| DataError::UnknownDataSet(name.to_string()))?;
        Ok((dataset, &mut self.wells))
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    pub fn classification(&self, name: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.name() == name)
    }

    /// Register a classification and tag every classified well with its category
    ///
    /// A classification with the same name is replaced. Returns
    /// [DataError::UnknownWell] if the classification names a well that is not
    /// on the plate; in that case nothing is changed.
    pub fn add_classification(&mut self, classification: Classification) -> Result<(), DataError> {
        for category in classification.groups() {
            for id in category.wells() {
                if self.well(id).is_none() {
                    return Err(DataError::UnknownWell(id.clone()));
                }
            }
        }
        for category in classification.groups() {
            for id in category.wells() {
                if let Some(well) = self.well_mut(id) {
                    well.set_category(classification.name(), category.value());
                }
            }
        }
        match self
            .classifications
            .iter_mut()
            .find(|c| c.name() == classification.name())
        {
            Some(existing) => *existing = classification,
            None => self.classifications.push(classification),
        }
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Well> {
        self.wells.iter()
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }
}

impl<'a> IntoIterator for &'a WellSet {
    type Item = &'a Well;
    type IntoIter = std::slice::Iter<'a, Well>;

    fn into_iter(self) -> Self::IntoIter {
        self.wells.iter()
    }
}

/// One physical sample location on a plate
///
/// A [Well] holds raw [Reading]s and the derived [Parameter]s produced by the
/// analysis. At most one parameter per [ParameterName] is kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Well {
    pub(crate) id: String,
    pub(crate) source: String,
    pub(crate) experiment: String,
    pub(crate) position: String,
    pub(crate) sample: String,
    pub(crate) reporter: String,
    pub(crate) target: String,
    pub(crate) readings: Vec<Reading>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) categories: BTreeMap<String, String>,
}

impl Well {
    pub fn new(id: impl Into<String>) -> Self {
        Well {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn reporter(&self) -> &str {
        &self.reporter
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn reading(&self, name: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.name() == name)
    }

    pub fn reading_mut(&mut self, name: &str) -> Option<&mut Reading> {
        self.readings.iter_mut().find(|r| r.name() == name)
    }

    /// Get a reading by name or fail with [DataError::UnknownReading]
    pub fn require_reading(&self, name: &str) -> Result<&Reading, DataError> {
        self.reading(name).ok_or_else(|| DataError::UnknownReading {
            well: self.id.clone(),
            reading: name.to_string(),
        })
    }

    /// Add a reading, replacing any reading with the same name
    pub fn add_reading(&mut self, reading: Reading) {
        match self.readings.iter_mut().find(|r| r.name() == reading.name()) {
            Some(existing) => *existing = reading,
            None => self.readings.push(reading),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &ParameterName) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Attach a parameter, overwriting any parameter with the same name
    pub fn assign_parameter(&mut self, parameter: Parameter) -> Assignment {
        assign_by_name(&mut self.parameters, parameter, |_, _| true)
    }

    /// Attach a parameter, asking `confirm` before overwriting an existing one
    ///
    /// `confirm` receives the existing and the incoming parameter. Returning
    /// `false` keeps the existing value.
    pub fn assign_parameter_with<F>(&mut self, parameter: Parameter, confirm: F) -> Assignment
    where
        F: FnOnce(&Parameter, &Parameter) -> bool,
    {
        assign_by_name(&mut self.parameters, parameter, confirm)
    }

    pub fn reset_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn reset_readings(&mut self) {
        self.readings.clear();
    }

    pub fn categories(&self) -> &BTreeMap<String, String> {
        &self.categories
    }

    /// Category value of this well under the given classification
    pub fn category(&self, classification: &str) -> Option<&str> {
        self.categories.get(classification).map(|s| s.as_str())
    }

    pub fn set_category(&mut self, classification: impl Into<String>, value: impl Into<String>) {
        self.categories.insert(classification.into(), value.into());
    }
}

impl fmt::Display for WellSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Plate '{}': {} wells, {} data sets",
            self.name,
            self.wells.len(),
            self.datasets.len()
        )?;
        for well in &self.wells {
            writeln!(f, "{}", well)?;
        }
        Ok(())
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Well {} ({})", self.id, self.sample)?;
        for reading in &self.readings {
            writeln!(f, "  {}", reading)?;
        }
        for parameter in &self.parameters {
            writeln!(f, "  {}", parameter)?;
        }
        Ok(())
    }
}
