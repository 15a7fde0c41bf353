use argmin::{
    core::{CostFunction, Error, Executor, State, TerminationReason, TerminationStatus},
    solver::neldermead::NelderMead,
};
use serde::{Deserialize, Serialize};

use super::error::FitError;
use super::models::Model;

/// Optional lower and upper limit of one parameter
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ParamBound {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ParamBound {
    pub fn free() -> Self {
        ParamBound::default()
    }

    pub fn at_least(lower: f64) -> Self {
        ParamBound {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn at_most(upper: f64) -> Self {
        ParamBound {
            lower: None,
            upper: Some(upper),
        }
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        ParamBound {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.lower.map_or(value, |lo| value.max(lo));
        self.upper.map_or(value, |hi| value.min(hi))
    }

    /// Distance from `value` to the feasible interval
    fn violation(&self, value: f64) -> f64 {
        let below = self.lower.map_or(0.0, |lo| (lo - value).max(0.0));
        let above = self.upper.map_or(0.0, |hi| (value - hi).max(0.0));
        below + above
    }
}

/// Per-parameter bounds of a fit
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Bounds(pub Vec<ParamBound>);

impl Bounds {
    pub fn new(bounds: Vec<ParamBound>) -> Self {
        Bounds(bounds)
    }

    pub fn free(n: usize) -> Self {
        Bounds(vec![ParamBound::free(); n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clamp every parameter into its interval
    pub fn project(&self, params: &[f64]) -> Vec<f64> {
        params
            .iter()
            .zip(self.0.iter())
            .map(|(p, b)| b.clamp(*p))
            .collect()
    }

    fn violation(&self, params: &[f64]) -> f64 {
        params
            .iter()
            .zip(self.0.iter())
            .map(|(p, b)| b.violation(*p))
            .sum()
    }

    fn validate(&self, model: &str, n_params: usize) -> Result<(), FitError> {
        if self.0.len() != n_params {
            return Err(FitError::ParameterCount {
                model: model.to_string(),
                expected: n_params,
                found: self.0.len(),
            });
        }
        for (index, bound) in self.0.iter().enumerate() {
            if let (Some(lower), Some(upper)) = (bound.lower, bound.upper) {
                if lower > upper || lower.is_nan() || upper.is_nan() {
                    return Err(FitError::InvalidBounds {
                        index,
                        lower,
                        upper,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Half-open `[start, end)` index window of the samples used in a fit
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FitWindow {
    pub start: usize,
    pub end: Option<usize>,
}

impl FitWindow {
    /// Every sample
    pub fn full() -> Self {
        FitWindow::default()
    }

    pub fn new(start: usize, end: usize) -> Self {
        FitWindow {
            start,
            end: Some(end),
        }
    }

    /// From `start` to the last sample
    pub fn from(start: usize) -> Self {
        FitWindow { start, end: None }
    }

    /// Concrete `(start, end)` for a series of `len` samples
    pub fn resolve(&self, len: usize) -> (usize, usize) {
        let end = self.end.map_or(len, |e| e.min(len));
        (self.start.min(end), end)
    }
}

/// Optimizer settings
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Iteration budget; reaching it is reported as divergence
    pub max_iters: u64,
    /// Standard deviation of the simplex costs at which the search stops
    pub sd_tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            max_iters: 5000,
            sd_tolerance: 1e-12,
        }
    }
}

/// Outcome of a successful [fit]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FitResult {
    /// x values inside the fitting window
    pub x: Vec<f64>,
    /// Model evaluated at `x`
    pub y_fit: Vec<f64>,
    pub params: Vec<f64>,
    pub r_squared: f64,
    pub iterations: u64,
}

/// Coefficient of determination `1 - SS_res / SS_tot`
///
/// A constant `y` gives 1.0.
pub fn r_squared(y: &[f64], y_fit: &[f64]) -> f64 {
    let (ss_res, ss_tot) = sums_of_squares(y, y_fit);
    if ss_tot < 1e-15 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

fn sums_of_squares(y: &[f64], y_fit: &[f64]) -> (f64, f64) {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let ss_res = y
        .iter()
        .zip(y_fit.iter())
        .map(|(yi, fi)| (yi - fi).powi(2))
        .sum();
    let ss_tot = y.iter().map(|yi| (yi - mean).powi(2)).sum();
    (ss_res, ss_tot)
}

/// Scale-free least squares cost over a window
///
/// Parameters outside their bounds are evaluated at their projection, plus a
/// penalty growing with the distance to the feasible box.
struct LeastSquares<'a, M: Model> {
    model: &'a M,
    x: &'a [f64],
    y: &'a [f64],
    bounds: &'a Bounds,
    scale: f64,
}

impl<'a, M: Model> LeastSquares<'a, M> {
    fn new(model: &'a M, x: &'a [f64], y: &'a [f64], bounds: &'a Bounds) -> Self {
        let (_, ss_tot) = sums_of_squares(y, y);
        let scale = if ss_tot < 1e-15 { 1.0 } else { ss_tot };
        LeastSquares {
            model,
            x,
            y,
            bounds,
            scale,
        }
    }

    fn evaluate(&self, params: &[f64]) -> f64 {
        let projected = self.bounds.project(params);
        let ss_res: f64 = self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(xi, yi)| (yi - self.model.eval(*xi, &projected)).powi(2))
            .sum();
        let cost = ss_res / self.scale + self.bounds.violation(params);
        if cost.is_finite() {
            cost
        } else {
            f64::MAX
        }
    }
}

impl<M: Model> CostFunction for LeastSquares<'_, M> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(params))
    }
}

/// Bounded nonlinear least squares
///
/// Fits `model` to the samples of `x` and `y` inside `window`. The search
/// starts from `initial`, or from the model's closed-form estimate when that
/// fits the window better. R² is computed on the window only.
///
/// # Errors
///
/// * [FitError::ParameterCount] when `initial` or `bounds` do not match the model
/// * [FitError::InvalidBounds] when a lower bound exceeds its upper bound
/// * [FitError::InsufficientData] when the window holds fewer samples than parameters
/// * [FitError::Divergence] when the optimizer exhausts its iteration budget
pub fn fit<M: Model>(
    x: &[f64],
    y: &[f64],
    model: &M,
    initial: &[f64],
    bounds: &Bounds,
    window: FitWindow,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let n_params = model.n_params();
    if initial.len() != n_params {
        return Err(FitError::ParameterCount {
            model: model.name().to_string(),
            expected: n_params,
            found: initial.len(),
        });
    }
    bounds.validate(model.name(), n_params)?;

    let (start, end) = window.resolve(x.len().min(y.len()));
    let xs = &x[start..end];
    let ys = &y[start..end];
    if xs.len() < n_params || xs.is_empty() {
        return Err(FitError::InsufficientData {
            n: xs.len(),
            required: n_params.max(1),
        });
    }

    let problem = LeastSquares::new(model, xs, ys, bounds);
    let mut start_point = bounds.project(initial);
    if let Some(estimate) = model.initial_estimate(xs, ys) {
        let estimate = bounds.project(&estimate);
        if estimate.iter().all(|v| v.is_finite())
            && problem.evaluate(&estimate) < problem.evaluate(&start_point)
        {
            start_point = estimate;
        }
    }

    let simplex = create_initial_simplex(&start_point);
    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex)
        .with_sd_tolerance(options.sd_tolerance)
        .map_err(|e| FitError::Divergence {
            reason: e.to_string(),
        })?;
    let res = Executor::new(problem, solver)
        .configure(|state| state.max_iters(options.max_iters))
        .run()
        .map_err(|e| FitError::Divergence {
            reason: e.to_string(),
        })?;

    let iterations = res.state.get_iter();
    if let TerminationStatus::Terminated(TerminationReason::MaxItersReached) =
        res.state.get_termination_status()
    {
        return Err(FitError::Divergence {
            reason: format!("no convergence after {} iterations", iterations),
        });
    }
    let best = res.state.best_param.ok_or_else(|| FitError::Divergence {
        reason: "optimizer returned no parameters".to_string(),
    })?;

    let params = bounds.project(&best);
    let y_fit = model.curve(xs, &params);
    if params.iter().chain(y_fit.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::Divergence {
            reason: format!("non-finite result {:?}", params),
        });
    }
    let r_squared = r_squared(ys, &y_fit);
    tracing::debug!(
        model = model.name(),
        iterations,
        r_squared,
        "fit converged with {:?}",
        params
    );

    Ok(FitResult {
        x: xs.to_vec(),
        y_fit,
        params,
        r_squared,
        iterations,
    })
}

fn create_initial_simplex(initial_point: &[f64]) -> Vec<Vec<f64>> {
    let num_dimensions = initial_point.len();
    let perturbation_percentage = 0.05;

    let mut vertices = Vec::with_capacity(num_dimensions + 1);
    vertices.push(initial_point.to_vec());

    for i in 0..num_dimensions {
        let perturbation = if initial_point[i] == 0.0 {
            0.01
        } else {
            perturbation_percentage * initial_point[i]
        };

        let mut perturbed_point = initial_point.to_owned();
        perturbed_point[i] += perturbation;
        vertices.push(perturbed_point);
    }

    vertices
}
