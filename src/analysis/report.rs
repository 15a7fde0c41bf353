use serde::Serialize;
use std::fmt;

use super::error::AnalysisError;

/// A well that could not be processed, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct WellFailure {
    pub well: String,
    pub error: AnalysisError,
}

impl fmt::Display for WellFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.well, self.error)
    }
}

/// Outcome of a batch pass over many wells
///
/// Every well handed to a pass ends up in exactly one of the two lists.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    pub succeeded: Vec<(String, T)>,
    pub failed: Vec<WellFailure>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        BatchReport {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&mut self, well: impl Into<String>, value: T) {
        self.succeeded.push((well.into(), value));
    }

    pub fn push_err(&mut self, well: impl Into<String>, error: AnalysisError) {
        self.failed.push(WellFailure {
            well: well.into(),
            error,
        });
    }

    /// Record a per-well result
    pub fn record(&mut self, well: impl Into<String>, result: Result<T, AnalysisError>) {
        match result {
            Ok(value) => self.push_ok(well, value),
            Err(error) => {
                let well = well.into();
                tracing::warn!(well = %well, "{}", error);
                self.push_err(well, error);
            }
        }
    }

    pub fn success(&self, well: &str) -> Option<&T> {
        self.succeeded
            .iter()
            .find(|(id, _)| id == well)
            .map(|(_, value)| value)
    }

    pub fn failure(&self, well: &str) -> Option<&AnalysisError> {
        self.failed
            .iter()
            .find(|f| f.well == well)
            .map(|f| &f.error)
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> BatchReport<U> {
        BatchReport {
            succeeded: self
                .succeeded
                .into_iter()
                .map(|(well, value)| (well, f(value)))
                .collect(),
            failed: self.failed,
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    well: &'a str,
    status: &'static str,
    value: String,
    reason: String,
}

impl<T: fmt::Display> BatchReport<T> {
    /// Write one row per well: `well,status,value,reason`
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for (well, value) in &self.succeeded {
            wtr.serialize(CsvRow {
                well,
                status: "ok",
                value: value.to_string(),
                reason: String::new(),
            })?;
        }
        for failure in &self.failed {
            wtr.serialize(CsvRow {
                well: &failure.well,
                status: "failed",
                value: String::new(),
                reason: failure.error.to_string(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl<T: fmt::Display> fmt::Display for BatchReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} wells: {} succeeded, {} failed",
            self.len(),
            self.succeeded.len(),
            self.failed.len()
        )?;
        for (well, value) in &self.succeeded {
            writeln!(f, "  {}: {}", well, value)?;
        }
        for failure in &self.failed {
            writeln!(f, "  {}", failure)?;
        }
        Ok(())
    }
}
