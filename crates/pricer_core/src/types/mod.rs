//! Core numeric types.
//!
//! This module provides:
//! - `random_variable`: Deterministic or path-wise stochastic values
//! - `time_discretization`: Strictly increasing time and tenor grids
//! - `parameter_vector`: Ordered parameter vectors exchanged with the optimizer
//! - `error`: Structured error types for pricing, solver, model and calibration failures
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level.

pub mod error;
pub mod parameter_vector;
pub mod random_variable;
pub mod time_discretization;

pub use error::{
    CalibrationError, CalibrationErrorKind, ModelError, PricingError, SolverError,
};
pub use parameter_vector::ParameterVector;
pub use random_variable::RandomVariable;
pub use time_discretization::TimeDiscretization;
