//! Decision points of the region detector
//!
//! The detector asks a [DecisionStrategy] twice per well: once to confirm the
//! exponential region and once to confirm the plateau start. It asks again
//! before overwriting an existing parameter. Batch runs use [AutoAccept],
//! precomputed corrections use [Overrides], and interactive front ends plug
//! their prompt into [HumanInTheLoop].

use std::collections::HashMap;

use crate::data::{Parameter, ResponseRegion};

/// What the detector shows before fixing the exponential region
#[derive(Debug, Clone, Copy)]
pub struct RegionReview<'a> {
    pub well: &'a str,
    pub x: &'a [f64],
    /// Signal divided by the data set maximum
    pub y: &'a [f64],
    /// Second derivative of `y`, divided by its largest absolute value
    pub ddy: &'a [f64],
    pub proposed: ResponseRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionDecision {
    Accept,
    /// Use these first and last indices of the exponential region instead
    Override { p1: usize, p2: usize },
    /// The well shows no exponential growth
    NoExponential,
}

/// What the detector shows before fixing the plateau start
#[derive(Debug, Clone, Copy)]
pub struct PlateauReview<'a> {
    pub well: &'a str,
    pub x: &'a [f64],
    pub y: &'a [f64],
    /// Region after the exponential decision
    pub proposed: ResponseRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateauDecision {
    Accept,
    /// Fit the plateau from this index
    Override(usize),
    /// Use the series maximum as plateau level
    UseMaximum,
}

pub trait DecisionStrategy {
    fn review_region(&mut self, review: &RegionReview) -> RegionDecision;

    fn review_plateau(&mut self, review: &PlateauReview) -> PlateauDecision;

    /// Whether `incoming` may overwrite `existing`
    fn confirm_replace(&mut self, _existing: &Parameter, _incoming: &Parameter) -> bool {
        true
    }
}

/// Accept every proposal and every replacement
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAccept;

impl DecisionStrategy for AutoAccept {
    fn review_region(&mut self, _review: &RegionReview) -> RegionDecision {
        RegionDecision::Accept
    }

    fn review_plateau(&mut self, _review: &PlateauReview) -> PlateauDecision {
        PlateauDecision::Accept
    }
}

/// Externally supplied `[p1, p2, p3]` triples keyed by well id
///
/// `-1` keeps its usual meaning: `p1 = p2 = -1` marks a well without
/// exponential region and `p3 = -1` selects the series maximum. Wells without
/// a triple fall back to the proposal.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    triples: HashMap<String, [i64; 3]>,
}

impl Overrides {
    pub fn new() -> Self {
        Overrides::default()
    }

    pub fn with(mut self, well: impl Into<String>, triple: [i64; 3]) -> Self {
        self.insert(well, triple);
        self
    }

    pub fn insert(&mut self, well: impl Into<String>, triple: [i64; 3]) {
        self.triples.insert(well.into(), triple);
    }

    pub fn get(&self, well: &str) -> Option<[i64; 3]> {
        self.triples.get(well).copied()
    }
}

impl DecisionStrategy for Overrides {
    fn review_region(&mut self, review: &RegionReview) -> RegionDecision {
        match self.get(review.well) {
            None => RegionDecision::Accept,
            Some([p1, p2, _]) if p1 < 0 && p2 < 0 => RegionDecision::NoExponential,
            // Negative single indices are rejected by the detector as an invalid region
            Some([p1, p2, _]) => RegionDecision::Override {
                p1: usize::try_from(p1).unwrap_or(usize::MAX),
                p2: usize::try_from(p2).unwrap_or(usize::MAX),
            },
        }
    }

    fn review_plateau(&mut self, review: &PlateauReview) -> PlateauDecision {
        match self.get(review.well) {
            None => PlateauDecision::Accept,
            Some([_, _, p3]) if p3 < 0 => PlateauDecision::UseMaximum,
            Some([_, _, p3]) => PlateauDecision::Override(p3 as usize),
        }
    }
}

type RegionPrompt = Box<dyn FnMut(&RegionReview) -> RegionDecision>;
type PlateauPrompt = Box<dyn FnMut(&PlateauReview) -> PlateauDecision>;
type ReplacePrompt = Box<dyn FnMut(&Parameter, &Parameter) -> bool>;

/// Adapter forwarding every decision to caller-provided callbacks
///
/// The callbacks typically render the review and block on operator input.
pub struct HumanInTheLoop {
    region: RegionPrompt,
    plateau: PlateauPrompt,
    replace: Option<ReplacePrompt>,
}

impl HumanInTheLoop {
    pub fn new<R, P>(region: R, plateau: P) -> Self
    where
        R: FnMut(&RegionReview) -> RegionDecision + 'static,
        P: FnMut(&PlateauReview) -> PlateauDecision + 'static,
    {
        HumanInTheLoop {
            region: Box::new(region),
            plateau: Box::new(plateau),
            replace: None,
        }
    }

    pub fn with_confirm<C>(mut self, confirm: C) -> Self
    where
        C: FnMut(&Parameter, &Parameter) -> bool + 'static,
    {
        self.replace = Some(Box::new(confirm));
        self
    }
}

impl DecisionStrategy for HumanInTheLoop {
    fn review_region(&mut self, review: &RegionReview) -> RegionDecision {
        (self.region)(review)
    }

    fn review_plateau(&mut self, review: &PlateauReview) -> PlateauDecision {
        (self.plateau)(review)
    }

    fn confirm_replace(&mut self, existing: &Parameter, incoming: &Parameter) -> bool {
        match self.replace.as_mut() {
            Some(confirm) => confirm(existing, incoming),
            None => true,
        }
    }
}
