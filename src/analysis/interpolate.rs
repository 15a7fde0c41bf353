//! One-dimensional interpolation over strictly increasing samples

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::error::AnalysisError;

/// Interpolant family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationKind {
    /// Value of the closest sample; ties go to the lower sample
    Nearest,
    Linear,
    /// C¹ piecewise quadratic spline
    #[default]
    Quadratic,
    /// Natural cubic spline
    Cubic,
    /// Value of the closest sample at or below x
    Previous,
    /// Value of the closest sample at or above x
    Next,
}

impl InterpolationKind {
    /// Minimum number of samples to build the interpolant
    pub fn min_points(&self) -> usize {
        match self {
            InterpolationKind::Quadratic => 3,
            InterpolationKind::Cubic => 4,
            _ => 2,
        }
    }
}

/// Piecewise interpolant through `(x, y)`
///
/// Queries outside `[x_min, x_max]` are clamped to the range.
#[derive(Debug, Clone)]
pub struct Interpolator {
    kind: InterpolationKind,
    x: Vec<f64>,
    y: Vec<f64>,
    /// Per-segment polynomial `a + b t + c t² + d t³`, `t = x - x_i`
    segments: Vec<[f64; 4]>,
}

impl Interpolator {
    /// Build an interpolant
    ///
    /// # Errors
    ///
    /// [AnalysisError::InsufficientData] below [InterpolationKind::min_points],
    /// [AnalysisError::InvalidParameter] when `x` is not strictly increasing or
    /// a sample is not finite.
    pub fn new(kind: InterpolationKind, x: &[f64], y: &[f64]) -> Result<Self, AnalysisError> {
        let n = x.len().min(y.len());
        if n < kind.min_points() {
            return Err(AnalysisError::InsufficientData {
                n,
                required: kind.min_points(),
            });
        }
        let x = x[..n].to_vec();
        let y = y[..n].to_vec();
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidParameter {
                param: "samples".to_string(),
                value: "non-finite value".to_string(),
            });
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InvalidParameter {
                param: "x".to_string(),
                value: "not strictly increasing".to_string(),
            });
        }

        let segments = match kind {
            InterpolationKind::Linear => linear_segments(&x, &y),
            InterpolationKind::Quadratic => quadratic_segments(&x, &y),
            InterpolationKind::Cubic => cubic_segments(&x, &y)?,
            _ => Vec::new(),
        };

        Ok(Interpolator {
            kind,
            x,
            y,
            segments,
        })
    }

    pub fn kind(&self) -> InterpolationKind {
        self.kind
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        let xq = xq.clamp(self.x_min(), self.x_max());
        let i = self
            .x
            .partition_point(|v| *v <= xq)
            .saturating_sub(1)
            .min(n - 2);

        match self.kind {
            InterpolationKind::Nearest => {
                if xq - self.x[i] <= self.x[i + 1] - xq {
                    self.y[i]
                } else {
                    self.y[i + 1]
                }
            }
            InterpolationKind::Previous => {
                if xq >= self.x[i + 1] {
                    self.y[i + 1]
                } else {
                    self.y[i]
                }
            }
            InterpolationKind::Next => {
                if xq <= self.x[i] {
                    self.y[i]
                } else {
                    self.y[i + 1]
                }
            }
            _ => {
                let [a, b, c, d] = self.segments[i];
                let t = xq - self.x[i];
                a + t * (b + t * (c + t * d))
            }
        }
    }

    pub fn eval_many(&self, xq: &[f64]) -> Vec<f64> {
        xq.iter().map(|x| self.eval(*x)).collect()
    }
}

/// `n` evenly spaced points from `start` to `end`, both included
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn linear_segments(x: &[f64], y: &[f64]) -> Vec<[f64; 4]> {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| [yw[0], (yw[1] - yw[0]) / (xw[1] - xw[0]), 0.0, 0.0])
        .collect()
}

/// Quadratic pieces with continuous first derivative
///
/// The slope at the first sample is that of the parabola through the first
/// three samples; each following slope is carried over from the previous piece.
fn quadratic_segments(x: &[f64], y: &[f64]) -> Vec<[f64; 4]> {
    let (x0, x1, x2) = (x[0], x[1], x[2]);
    let mut slope = y[0] * (2.0 * x0 - x1 - x2) / ((x0 - x1) * (x0 - x2))
        + y[1] * (x0 - x2) / ((x1 - x0) * (x1 - x2))
        + y[2] * (x0 - x1) / ((x2 - x0) * (x2 - x1));

    let mut segments = Vec::with_capacity(x.len() - 1);
    for i in 0..x.len() - 1 {
        let h = x[i + 1] - x[i];
        let c = (y[i + 1] - y[i] - slope * h) / (h * h);
        segments.push([y[i], slope, c, 0.0]);
        slope += 2.0 * c * h;
    }
    segments
}

/// Natural cubic spline: zero second derivative at both ends
fn cubic_segments(x: &[f64], y: &[f64]) -> Result<Vec<[f64; 4]>, AnalysisError> {
    let m = x.len();
    let k = m - 1;
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // Second-derivative half-coefficients c_i on the knots
    let mut system = DMatrix::<f64>::zeros(m, m);
    let mut rhs = DVector::<f64>::zeros(m);
    system[(0, 0)] = 1.0;
    system[(k, k)] = 1.0;
    for i in 1..k {
        system[(i, i - 1)] = h[i - 1];
        system[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        system[(i, i + 1)] = h[i];
        rhs[i] = 3.0 / h[i] * (y[i + 1] - y[i]) - 3.0 / h[i - 1] * (y[i] - y[i - 1]);
    }
    let c = system
        .lu()
        .solve(&rhs)
        .ok_or_else(|| AnalysisError::InvalidParameter {
            param: "x".to_string(),
            value: "singular spline system".to_string(),
        })?;

    Ok((0..k)
        .map(|j| {
            let b = (y[j + 1] - y[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            let d = (c[j + 1] - c[j]) / (3.0 * h[j]);
            [y[j], b, c[j], d]
        })
        .collect())
}
