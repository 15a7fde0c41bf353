//! Bounded curve fitting
//!
//! [fit] minimises the sum of squared residuals of a [Model] over an index
//! window with a Nelder-Mead simplex, keeping parameters inside [Bounds].

pub mod error;
pub mod fit;
pub mod models;

pub use error::FitError;
pub use fit::{fit, r_squared, Bounds, FitOptions, FitResult, FitWindow, ParamBound};
pub use models::{
    linear_regression, ExpLinear, Flat, Invertible, Linear, Model, Reciprocal, Sigmoid,
};
