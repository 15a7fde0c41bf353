//! Parametric curve models
//!
//! | Model | f(x) | Parameters |
//! |-------|------|------------|
//! | [Linear] | a·x + b | `[a, b]` |
//! | [Flat] | b | `[b]` |
//! | [ExpLinear] | N·10^(a·x + b) | `[a, b]`, N fixed |
//! | [Reciprocal] | a·x^-b + c | `[a, b, c]` |
//! | [Sigmoid] | a / (1 + e^(-(x + b)·c)) | `[a, b, c]` |

use serde::{Deserialize, Serialize};

/// A curve with a fixed number of free parameters
pub trait Model {
    fn name(&self) -> &'static str;

    fn n_params(&self) -> usize;

    fn eval(&self, x: f64, params: &[f64]) -> f64;

    /// Closed-form starting point for the optimizer, when one exists
    fn initial_estimate(&self, _x: &[f64], _y: &[f64]) -> Option<Vec<f64>> {
        None
    }

    fn curve(&self, x: &[f64], params: &[f64]) -> Vec<f64> {
        x.iter().map(|xi| self.eval(*xi, params)).collect()
    }
}

/// A model with an exact inverse
pub trait Invertible: Model {
    /// x at which the model reaches `y`; non-finite when it never does
    fn invert(&self, y: f64, params: &[f64]) -> f64;
}

/// Ordinary least squares `y = slope * x + intercept`
///
/// Returns `(slope, intercept, r_squared)`, or `None` with fewer than two
/// points or a degenerate x.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64, f64)> {
    let n = x.len().min(y.len()) as f64;
    if n < 2.0 {
        return None;
    }

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum();
    let sum_x2: f64 = x.iter().map(|xi| xi * xi).sum();
    let sum_y2: f64 = y.iter().map(|yi| yi * yi).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < 1e-15 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;

    let ss_tot = sum_y2 - sum_y * sum_y / n;
    let ss_res: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let r_squared = if ss_tot.abs() < 1e-15 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Some((slope, intercept, r_squared))
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Linear;

impl Model for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn n_params(&self) -> usize {
        2
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        params[0] * x + params[1]
    }

    fn initial_estimate(&self, x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
        linear_regression(x, y).map(|(a, b, _)| vec![a, b])
    }
}

impl Invertible for Linear {
    fn invert(&self, y: f64, params: &[f64]) -> f64 {
        (y - params[1]) / params[0]
    }
}

/// Horizontal line, used for plateau levels
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Flat;

impl Model for Flat {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn n_params(&self) -> usize {
        1
    }

    fn eval(&self, _x: f64, params: &[f64]) -> f64 {
        params[0]
    }

    fn initial_estimate(&self, _x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
        if y.is_empty() {
            return None;
        }
        Some(vec![y.iter().sum::<f64>() / y.len() as f64])
    }
}

/// Exponential growth with a linear exponent, `N * 10^(a*x + b)`
///
/// `N` is the normalisation scale the curve was divided by and is not fitted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ExpLinear {
    pub scale: f64,
}

impl ExpLinear {
    pub fn new(scale: f64) -> Self {
        ExpLinear { scale }
    }

    /// Rebuild the model from a stored `[a, b, N]` triple
    pub fn from_stored(stored: &[f64]) -> Option<(Self, [f64; 2])> {
        match stored {
            [a, b, n] => Some((ExpLinear::new(*n), [*a, *b])),
            _ => None,
        }
    }

    /// `[a, b, N]` triple as stored on a well
    pub fn stored(&self, params: &[f64]) -> Vec<f64> {
        vec![params[0], params[1], self.scale]
    }
}

impl Model for ExpLinear {
    fn name(&self) -> &'static str {
        "exponential"
    }

    fn n_params(&self) -> usize {
        2
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        self.scale * 10f64.powf(params[0] * x + params[1])
    }

    /// Least squares on `log10(y / N)` over the positive samples
    fn initial_estimate(&self, x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
        let (lx, ly): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y.iter())
            .filter(|(_, yi)| **yi > 0.0)
            .map(|(xi, yi)| (*xi, (yi / self.scale).log10()))
            .unzip();
        linear_regression(&lx, &ly).map(|(a, b, _)| vec![a, b])
    }
}

impl Invertible for ExpLinear {
    fn invert(&self, y: f64, params: &[f64]) -> f64 {
        ((y / self.scale).log10() - params[1]) / params[0]
    }
}

/// Standard-curve model relating concentration to threshold time
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Reciprocal;

impl Model for Reciprocal {
    fn name(&self) -> &'static str {
        "reciprocal"
    }

    fn n_params(&self) -> usize {
        3
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        params[0] * x.powf(-params[1]) + params[2]
    }
}

impl Invertible for Reciprocal {
    fn invert(&self, y: f64, params: &[f64]) -> f64 {
        (params[0] / (y - params[2])).powf(1.0 / params[1])
    }
}

/// Logistic curve
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Sigmoid;

impl Model for Sigmoid {
    fn name(&self) -> &'static str {
        "sigmoid"
    }

    fn n_params(&self) -> usize {
        3
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        params[0] / (1.0 + (-(x + params[1]) * params[2]).exp())
    }
}

impl Invertible for Sigmoid {
    fn invert(&self, y: f64, params: &[f64]) -> f64 {
        -(params[0] / y - 1.0).ln() / params[2] - params[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_regression_exact() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let (a, b, r2) = linear_regression(&x, &y).unwrap();
        assert_relative_eq!(a, 2.0, epsilon = 1e-12);
        assert_relative_eq!(b, -1.0, epsilon = 1e-12);
        assert_relative_eq!(r2, 1.0, epsilon = 1e-12);
        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_exp_linear_inverse_uses_base_ten() {
        let model = ExpLinear::new(5000.0);
        let params = [0.3, -9.0];
        for x0 in [12.0, 20.5, 29.75] {
            let y = model.eval(x0, &params);
            assert_relative_eq!(model.invert(y, &params), x0, epsilon = 1e-10);
        }
        assert_eq!(model.stored(&params), vec![0.3, -9.0, 5000.0]);
        let (rebuilt, p) = ExpLinear::from_stored(&[0.3, -9.0, 5000.0]).unwrap();
        assert_eq!(rebuilt, model);
        assert_eq!(p, params);
    }

    #[test]
    fn test_exp_linear_estimate() {
        let model = ExpLinear::new(2.0);
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = model.curve(&x, &[0.2, -3.0]);
        let estimate = model.initial_estimate(&x, &y).unwrap();
        assert_relative_eq!(estimate[0], 0.2, epsilon = 1e-10);
        assert_relative_eq!(estimate[1], -3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_reciprocal_and_sigmoid_inverses() {
        let params = [40.0, 0.5, 3.0];
        let y = Reciprocal.eval(16.0, &params);
        assert_relative_eq!(Reciprocal.invert(y, &params), 16.0, epsilon = 1e-10);

        let params = [1.0, -20.0, 0.4];
        let y = Sigmoid.eval(22.0, &params);
        assert_relative_eq!(Sigmoid.invert(y, &params), 22.0, epsilon = 1e-10);
    }

    #[test]
    fn test_flat_estimate_is_mean() {
        assert_eq!(Flat.initial_estimate(&[], &[1.0, 2.0, 3.0]), Some(vec![2.0]));
        assert_eq!(Flat.initial_estimate(&[], &[]), None);
    }
}
