use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::DataError;

/// A labelled numeric sequence inside a [Reading], e.g. `"Cycle"` or `"ΔRn"`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Column {
    label: String,
    unit: String,
    values: Vec<f64>,
}

impl Column {
    pub fn new(label: impl Into<String>, unit: impl Into<String>, values: Vec<f64>) -> Self {
        Column {
            label: label.into(),
            unit: unit.into(),
            values,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One named measurement of a well
///
/// A [Reading] groups several labelled series that were recorded together,
/// for example the cycle number, the elapsed time and the fluorescence of an
/// amplification run. All columns of a reading have the same length.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reading {
    name: String,
    sheet: String,
    signal: String,
    columns: Vec<Column>,
}

impl Reading {
    /// Create an empty reading
    ///
    /// # Arguments
    ///
    /// * `name` - Reading name, e.g. `"Amplification data"`
    /// * `signal` - Signal descriptor, e.g. `"SYBR green fluorescence"`
    pub fn new(name: impl Into<String>, signal: impl Into<String>) -> Self {
        Reading {
            name: name.into(),
            sheet: String::new(),
            signal: signal.into(),
            columns: Vec::new(),
        }
    }

    /// Set the name of the spreadsheet the reading was taken from
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Labels of all columns, in insertion order
    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of samples per column (0 for an empty reading)
    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add or replace a column
    ///
    /// A column with the same label is replaced. Returns [DataError::LengthMismatch]
    /// if the new column does not match the length of the existing ones.
    pub fn add_column(&mut self, column: Column) -> Result<(), DataError> {
        let others = self
            .columns
            .iter()
            .find(|c| c.label() != column.label())
            .map(|c| c.len());
        if let Some(expected) = others {
            if expected != column.len() {
                return Err(DataError::LengthMismatch {
                    reading: self.name.clone(),
                    label: column.label,
                    expected,
                    found: column.values.len(),
                });
            }
        }
        match self.columns.iter_mut().find(|c| c.label() == column.label()) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Get a column by label
    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label() == label)
    }

    /// Values of a column by label
    pub fn values(&self, label: &str) -> Option<&[f64]> {
        self.column(label).map(|c| c.values())
    }

    /// Unit of a column by label
    pub fn unit(&self, label: &str) -> Option<&str> {
        self.column(label).map(|c| c.unit())
    }

    /// Derive a time column from a cycle column
    ///
    /// Each time value is `time_per_cycle * cycle`.
    pub fn add_time(
        &mut self,
        cycle_label: &str,
        time_per_cycle: f64,
        unit: impl Into<String>,
        time_label: impl Into<String>,
    ) -> Result<(), DataError> {
        let cycles = self
            .values(cycle_label)
            .ok_or_else(|| DataError::UnknownColumn {
                reading: self.name.clone(),
                label: cycle_label.to_string(),
            })?;
        let times = cycles.iter().map(|c| c * time_per_cycle).collect();
        self.add_column(Column::new(time_label, unit, times))
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' reading [{}] ({} samples)",
            self.name,
            self.labels().join(", "),
            self.len()
        )
    }
}
