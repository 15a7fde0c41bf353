use crate::data::*;

/// Fluent construction of a [Well]
///
/// Columns that fail the equal-length invariant of a [Reading] are reported
/// when [WellBuilder::try_build] is called.
pub struct WellBuilder {
    well: Well,
    current: Option<Reading>,
    error: Option<DataError>,
}

impl Well {
    pub fn builder(id: impl Into<String>) -> WellBuilder {
        WellBuilder {
            well: Well::new(id),
            current: None,
            error: None,
        }
    }
}

impl WellBuilder {
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.well.source = source.into();
        self
    }

    pub fn experiment(mut self, experiment: impl Into<String>) -> Self {
        self.well.experiment = experiment.into();
        self
    }

    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.well.position = position.into();
        self
    }

    pub fn sample(mut self, sample: impl Into<String>) -> Self {
        self.well.sample = sample.into();
        self
    }

    pub fn reporter(mut self, reporter: impl Into<String>) -> Self {
        self.well.reporter = reporter.into();
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.well.target = target.into();
        self
    }

    pub fn category(mut self, classification: &str, value: &str) -> Self {
        self.well.set_category(classification, value);
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.well.assign_parameter(parameter);
        self
    }

    /// Start a new reading; following `column` calls add to it
    pub fn reading(mut self, name: &str, signal: &str) -> Self {
        self.flush();
        self.current = Some(Reading::new(name, signal));
        self
    }

    /// Add a column to the current reading
    ///
    /// Opens an unnamed reading if none was started.
    pub fn column(mut self, label: &str, unit: &str, values: &[f64]) -> Self {
        let reading = self.current.get_or_insert_with(|| Reading::new("", ""));
        if let Err(e) = reading.add_column(Column::new(label, unit, values.to_vec())) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Shorthand for an `"Amplification data"` reading with an x and a y column
    pub fn amplification(self, x_label: &str, x: &[f64], y_label: &str, y: &[f64]) -> Self {
        self.reading(AMPLIFICATION_READING, "")
            .column(x_label, "", x)
            .column(y_label, "", y)
    }

    fn flush(&mut self) {
        if let Some(reading) = self.current.take() {
            self.well.add_reading(reading);
        }
    }

    /// Finish the well, returning the first column error if any occurred
    pub fn try_build(mut self) -> Result<Well, DataError> {
        self.flush();
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.well),
        }
    }

    /// Finish the well, dropping columns that failed the length check
    pub fn build(mut self) -> Well {
        self.flush();
        self.well
    }
}
