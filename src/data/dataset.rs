use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::DataError;
use super::parameter::Parameter;
use super::structs::Well;

/// One (x, y) curve of a single well
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataSerie {
    well: String,
    name: String,
    x: Vec<f64>,
    y: Vec<f64>,
    norm: Option<f64>,
    x_unit: String,
    y_unit: String,
}

impl DataSerie {
    /// Create a serie for `well`
    ///
    /// `x` and `y` are truncated to the shorter of the two.
    pub fn new(well: impl Into<String>, mut x: Vec<f64>, mut y: Vec<f64>) -> Self {
        let n = x.len().min(y.len());
        x.truncate(n);
        y.truncate(n);
        let well = well.into();
        DataSerie {
            name: well.clone(),
            well,
            x,
            y,
            norm: None,
            x_unit: String::new(),
            y_unit: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_units(mut self, x_unit: impl Into<String>, y_unit: impl Into<String>) -> Self {
        self.x_unit = x_unit.into();
        self.y_unit = y_unit.into();
        self
    }

    pub fn with_norm(mut self, norm: f64) -> Self {
        self.norm = Some(norm);
        self
    }

    /// Id of the well this serie was taken from
    pub fn well(&self) -> &str {
        &self.well
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn norm(&self) -> Option<f64> {
        self.norm
    }

    pub fn x_unit(&self) -> &str {
        &self.x_unit
    }

    pub fn y_unit(&self) -> &str {
        &self.y_unit
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Largest finite y value, if any
    pub fn y_max(&self) -> Option<f64> {
        self.y
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

/// An aggregate curve spanning several wells
///
/// Missing y values are kept as `None` so that a well without a result stays
/// visible in the output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupSerie {
    pub name: String,
    pub wells: Vec<String>,
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
    pub norm: Option<f64>,
    pub x_unit: String,
    pub y_unit: String,
}

impl GroupSerie {
    pub fn new(name: impl Into<String>) -> Self {
        GroupSerie {
            name: name.into(),
            wells: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            norm: None,
            x_unit: String::new(),
            y_unit: String::new(),
        }
    }

    pub fn push(&mut self, well: impl Into<String>, x: f64, y: Option<f64>) {
        self.wells.push(well.into());
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Points with a value, as `(x, y)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .filter_map(|(x, y)| y.map(|y| (*x, y)))
    }
}

/// Per-well side tables kept by a [DataSet]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideTable {
    MaxSignal,
    Exponential,
    ThresholdLimits,
    Named(String),
}

/// Where [DataSet::from_wells] reads its series from
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSource {
    pub reading: String,
    pub x: String,
    pub y: String,
    /// Half-open `[start, end)` index window, clamped to the series length
    pub limits: Option<(usize, usize)>,
}

impl SeriesSource {
    pub fn new(reading: &str, x: &str, y: &str) -> Self {
        SeriesSource {
            reading: reading.to_string(),
            x: x.to_string(),
            y: y.to_string(),
            limits: None,
        }
    }

    pub fn with_limits(mut self, start: usize, end: usize) -> Self {
        self.limits = Some((start, end));
        self
    }
}

/// A named collection of curves sharing axis semantics
///
/// Besides the series, a [DataSet] accumulates per-well analysis byproducts in
/// side tables keyed by well id. Re-running an analysis overwrites the entry
/// of each well instead of appending a new one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataSet {
    name: String,
    x_name: String,
    x_unit: String,
    y_name: String,
    y_unit: String,
    series: Vec<DataSerie>,
    y_max: Option<f64>,
    threshold: Option<f64>,
    max_signal: BTreeMap<String, Parameter>,
    exponential: BTreeMap<String, Parameter>,
    threshold_limits: BTreeMap<String, Parameter>,
    named: BTreeMap<String, BTreeMap<String, Parameter>>,
}

impl DataSet {
    pub fn new(name: impl Into<String>, x_name: impl Into<String>, y_name: impl Into<String>) -> Self {
        DataSet {
            name: name.into(),
            x_name: x_name.into(),
            x_unit: String::new(),
            y_name: y_name.into(),
            y_unit: String::new(),
            series: Vec::new(),
            y_max: None,
            threshold: None,
            max_signal: BTreeMap::new(),
            exponential: BTreeMap::new(),
            threshold_limits: BTreeMap::new(),
            named: BTreeMap::new(),
        }
    }

    pub fn with_units(mut self, x_unit: impl Into<String>, y_unit: impl Into<String>) -> Self {
        self.x_unit = x_unit.into();
        self.y_unit = y_unit.into();
        self
    }

    /// Build a data set from the readings of several wells
    ///
    /// Every well must carry the reading and both columns named in `source`.
    /// Units are taken from the first well.
    pub fn from_wells<'a, I>(
        name: impl Into<String>,
        wells: I,
        source: &SeriesSource,
    ) -> Result<DataSet, DataError>
    where
        I: IntoIterator<Item = &'a Well>,
    {
        let mut dataset = DataSet::new(name, source.x.clone(), source.y.clone());
        let mut units: Option<(String, String)> = None;

        for well in wells {
            let reading = well.require_reading(&source.reading)?;
            let column = |label: &str| {
                reading.column(label).ok_or_else(|| DataError::UnknownColumn {
                    reading: reading.name().to_string(),
                    label: label.to_string(),
                })
            };
            let x = column(&source.x)?;
            let y = column(&source.y)?;

            let n = reading.len();
            let (start, end) = match source.limits {
                Some((start, end)) => (start.min(n), end.min(n)),
                None => (0, n),
            };
            let end = end.max(start);

            if units.is_none() {
                units = Some((x.unit().to_string(), y.unit().to_string()));
            }
            let name = if well.sample().is_empty() {
                well.id()
            } else {
                well.sample()
            };
            let serie = DataSerie::new(
                well.id(),
                x.values()[start..end].to_vec(),
                y.values()[start..end].to_vec(),
            )
            .with_name(name)
            .with_units(x.unit(), y.unit());
            dataset.add_serie(serie);
        }

        if let Some((x_unit, y_unit)) = units {
            dataset.x_unit = x_unit;
            dataset.y_unit = y_unit;
        }
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x_name(&self) -> &str {
        &self.x_name
    }

    pub fn x_unit(&self) -> &str {
        &self.x_unit
    }

    pub fn y_name(&self) -> &str {
        &self.y_name
    }

    pub fn y_unit(&self) -> &str {
        &self.y_unit
    }

    pub fn series(&self) -> &[DataSerie] {
        &self.series
    }

    pub fn serie(&self, well: &str) -> Option<&DataSerie> {
        self.series.iter().find(|s| s.well() == well)
    }

    /// Add a serie, replacing the serie of the same well
    pub fn add_serie(&mut self, serie: DataSerie) {
        match self.series.iter_mut().find(|s| s.well() == serie.well()) {
            Some(existing) => *existing = serie,
            None => self.series.push(serie),
        }
        self.y_max = None;
    }

    /// Ids of the wells in this data set, in serie order
    pub fn well_ids(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.well()).collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Maximum y over every serie of the data set
    ///
    /// Computed once and cached until a serie is added. Returns
    /// [DataError::EmptyDataSet] when no serie holds a finite value.
    pub fn shared_max(&mut self) -> Result<f64, DataError> {
        if let Some(max) = self.y_max {
            return Ok(max);
        }
        let max = self
            .series
            .iter()
            .filter_map(|s| s.y_max())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
            .ok_or_else(|| DataError::EmptyDataSet(self.name.clone()))?;
        self.y_max = Some(max);
        Ok(max)
    }

    /// Cached shared maximum, if [DataSet::shared_max] has run
    pub fn y_max(&self) -> Option<f64> {
        self.y_max
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = Some(threshold);
    }

    pub fn table(&self, table: &SideTable) -> Option<&BTreeMap<String, Parameter>> {
        match table {
            SideTable::MaxSignal => Some(&self.max_signal),
            SideTable::Exponential => Some(&self.exponential),
            SideTable::ThresholdLimits => Some(&self.threshold_limits),
            SideTable::Named(name) => self.named.get(name),
        }
    }

    fn table_mut(&mut self, table: &SideTable) -> &mut BTreeMap<String, Parameter> {
        match table {
            SideTable::MaxSignal => &mut self.max_signal,
            SideTable::Exponential => &mut self.exponential,
            SideTable::ThresholdLimits => &mut self.threshold_limits,
            SideTable::Named(name) => self.named.entry(name.clone()).or_default(),
        }
    }

    /// Side-table entry of a well
    pub fn lookup(&self, table: &SideTable, well: &str) -> Option<&Parameter> {
        self.table(table).and_then(|t| t.get(well))
    }

    /// Write the side-table entry of a well, replacing any previous one
    pub fn record(&mut self, table: &SideTable, well: impl Into<String>, parameter: Parameter) {
        self.table_mut(table).insert(well.into(), parameter);
    }

    /// Names of the open-ended side tables
    pub fn named_tables(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(|k| k.as_str())
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Data set '{}': {} [{}] vs {} [{}], {} series",
            self.name,
            self.y_name,
            self.y_unit,
            self.x_name,
            self.x_unit,
            self.series.len()
        )
    }
}
