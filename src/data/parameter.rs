//! Derived values attached to wells and data sets
//!
//! A [Parameter] is identified by its [ParameterName] only. Re-assigning a
//! parameter with the same name replaces the previous value, which keeps
//! re-analysis from accumulating duplicated results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known parameter names used by the analysis engine
///
/// The engine only ever looks parameters up through these tags. `Custom`
/// covers user-defined values that the engine stores but never interprets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterName {
    /// Region indices `[p1, p2, p3]` of the amplification response
    ResponseRegion,
    /// Plateau signal `[normalized, raw]`
    MaxSignal,
    /// Exponential fit `[a, b, N]`, or the plateau level when no exponential region exists
    ExponentialFit,
    /// Cycle threshold
    Ct,
    /// Time threshold
    Tt,
    /// Melting peak coordinate
    Tm,
    /// Signal at the onset of the exponential region `[normalized, raw]`
    MinStepSignal,
    /// Difference between plateau and onset signal `[normalized, raw]`
    StepSignal,
    /// Threshold bounds of a single well `[lower, upper]`
    WellThresholdLimits,
    /// Concentration estimated from a threshold value
    Concentration,
    Custom(String),
}

impl ParameterName {
    pub fn as_str(&self) -> &str {
        match self {
            ParameterName::ResponseRegion => "Amplification response region",
            ParameterName::MaxSignal => "max signal",
            ParameterName::ExponentialFit => "exponential fit",
            ParameterName::Ct => "Ct",
            ParameterName::Tt => "Tt",
            ParameterName::Tm => "Tm",
            ParameterName::MinStepSignal => "min step signal",
            ParameterName::StepSignal => "step signal",
            ParameterName::WellThresholdLimits => "well threshold limits",
            ParameterName::Concentration => "concentration",
            ParameterName::Custom(name) => name,
        }
    }

    /// Default description used when a parameter is created without one
    fn default_description(&self) -> &'static str {
        match self {
            ParameterName::ResponseRegion => {
                "x vector index of exponential response region of the well amplification data"
            }
            ParameterName::MaxSignal => "maximum signal value [normalized, raw]",
            ParameterName::ExponentialFit => {
                "linear exponent parameters 'a', 'b' and normalization parameter 'N'. f(x) = N*10^(a*x+b)"
            }
            ParameterName::Ct => {
                "Cycle threshold. Intersection between threshold line and the fitted signal"
            }
            ParameterName::Tt => {
                "Time threshold. Intersection between threshold line and the fitted signal"
            }
            ParameterName::Tm => "Melting peak position",
            ParameterName::MinStepSignal => {
                "Signal value at the init of response region [normalized, not normalized]"
            }
            ParameterName::StepSignal => "Step signal [normalized, not normalized]",
            ParameterName::WellThresholdLimits => "well threshold limits [thr_min, thr_max]",
            ParameterName::Concentration => "Concentration estimated from the threshold value",
            ParameterName::Custom(_) => "",
        }
    }
}

impl From<&str> for ParameterName {
    fn from(name: &str) -> Self {
        let known = [
            ParameterName::ResponseRegion,
            ParameterName::MaxSignal,
            ParameterName::ExponentialFit,
            ParameterName::Ct,
            ParameterName::Tt,
            ParameterName::Tm,
            ParameterName::MinStepSignal,
            ParameterName::StepSignal,
            ParameterName::WellThresholdLimits,
            ParameterName::Concentration,
        ];
        known
            .into_iter()
            .find(|k| k.as_str() == name)
            .unwrap_or_else(|| ParameterName::Custom(name.to_string()))
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start of the plateau region
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plateau {
    /// Plateau is fitted from this index to the end of the series
    From(usize),
    /// Use the series maximum directly instead of fitting a flat tail
    Maximum,
}

/// Index triple delimiting the amplification response of a well
///
/// `exponential` holds `(p1, p2)`, the first and last index of the exponential
/// region, or `None` when the well shows no exponential behaviour.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseRegion {
    pub exponential: Option<(usize, usize)>,
    pub plateau: Plateau,
}

impl ResponseRegion {
    pub fn new(p1: usize, p2: usize, p3: usize) -> Self {
        ResponseRegion {
            exponential: Some((p1, p2)),
            plateau: Plateau::From(p3),
        }
    }

    pub fn onset(&self) -> Option<usize> {
        self.exponential.map(|(p1, _)| p1)
    }

    pub fn end(&self) -> Option<usize> {
        self.exponential.map(|(_, p2)| p2)
    }

    pub fn plateau_start(&self) -> Option<usize> {
        match self.plateau {
            Plateau::From(p3) => Some(p3),
            Plateau::Maximum => None,
        }
    }

    /// Raw `[p1, p2, p3]` triple, `-1` marking an absent region
    pub fn to_raw(&self) -> [i64; 3] {
        let (p1, p2) = self
            .exponential
            .map(|(a, b)| (a as i64, b as i64))
            .unwrap_or((-1, -1));
        let p3 = self.plateau_start().map(|p| p as i64).unwrap_or(-1);
        [p1, p2, p3]
    }

    /// Parse a raw `[p1, p2, p3]` triple
    ///
    /// `p1 = p2 = -1` means no exponential region, `p3 = -1` means the series
    /// maximum is used as plateau. Returns `None` for malformed triples: a
    /// single `-1` in the exponential pair, an index below `-1`, or `p1 > p2`.
    pub fn from_raw(raw: [i64; 3]) -> Option<Self> {
        let [p1, p2, p3] = raw;
        if p1 < -1 || p2 < -1 || p3 < -1 {
            return None;
        }
        let exponential = match (p1, p2) {
            (-1, -1) => None,
            (-1, _) | (_, -1) => return None,
            (a, b) if a > b => return None,
            (a, b) => Some((a as usize, b as usize)),
        };
        let plateau = if p3 == -1 {
            Plateau::Maximum
        } else {
            Plateau::From(p3 as usize)
        };
        Some(ResponseRegion {
            exponential,
            plateau,
        })
    }

    /// Whether every index in the region addresses a series of `len` points
    pub fn within(&self, len: usize) -> bool {
        let exp_ok = self.exponential.map(|(_, p2)| p2 < len).unwrap_or(true);
        let plateau_ok = self.plateau_start().map(|p3| p3 < len).unwrap_or(true);
        exp_ok && plateau_ok
    }
}

impl fmt::Display for ResponseRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [p1, p2, p3] = self.to_raw();
        write!(f, "[{}, {}, {}]", p1, p2, p3)
    }
}

/// Value carried by a [Parameter]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Scalar(f64),
    Pair(f64, f64),
    Tuple(Vec<f64>),
    Region(ResponseRegion),
}

impl ParameterValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParameterValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(f64, f64)> {
        match self {
            ParameterValue::Pair(a, b) => Some((*a, *b)),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[f64]> {
        match self {
            ParameterValue::Tuple(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_region(&self) -> Option<&ResponseRegion> {
        match self {
            ParameterValue::Region(region) => Some(region),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Scalar(v) => write!(f, "{}", v),
            ParameterValue::Pair(a, b) => write!(f, "[{}, {}]", a, b),
            ParameterValue::Tuple(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            ParameterValue::Region(region) => write!(f, "{}", region),
        }
    }
}

/// A named, unit-tagged derived value
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameter {
    name: ParameterName,
    description: String,
    unit: String,
    value: ParameterValue,
    properties: BTreeMap<String, String>,
}

impl Parameter {
    pub fn new(name: ParameterName, value: ParameterValue) -> Self {
        let description = name.default_description().to_string();
        Parameter {
            name,
            description,
            unit: String::new(),
            value,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &ParameterName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} has a value of {} {}", self.name, self.value, self.unit)
    }
}

/// Outcome of a replace-by-name assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// No parameter with that name existed
    Appended,
    /// The previous parameter was overwritten in place
    Replaced,
    /// The previous parameter was kept and the new one discarded
    Kept,
}

/// Replace-by-name insertion into an ordered parameter list
///
/// `confirm` is consulted only when a parameter with the same name exists.
/// Returning `false` keeps the old value.
pub(crate) fn assign_by_name<F>(
    parameters: &mut Vec<Parameter>,
    parameter: Parameter,
    confirm: F,
) -> Assignment
where
    F: FnOnce(&Parameter, &Parameter) -> bool,
{
    match parameters.iter_mut().find(|p| p.name == parameter.name) {
        Some(existing) => {
            if confirm(existing, &parameter) {
                *existing = parameter;
                Assignment::Replaced
            } else {
                Assignment::Kept
            }
        }
        None => {
            parameters.push(parameter);
            Assignment::Appended
        }
    }
}
