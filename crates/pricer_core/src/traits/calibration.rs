//! Parameter bounds for calibration.
//!
//! [`ParameterBounds`] describes the admissible range of one model parameter.
//! A vector of bounds is split into the lower/upper vectors consumed by the
//! least-squares solver with [`split_bounds`].
//!
//! # Example
//!
//! ```
//! use pricer_core::traits::calibration::{split_bounds, ParameterBounds};
//!
//! let bounds = [ParameterBounds::positive(), ParameterBounds::unit_interval()];
//! let (lower, upper) = split_bounds(&bounds);
//! assert_eq!(lower, vec![1e-10, 0.0]);
//! assert_eq!(upper, vec![f64::INFINITY, 1.0]);
//! ```

use crate::math::solvers::ParameterTransform;
use crate::types::SolverError;

/// Bounds for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterBounds {
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
}

impl ParameterBounds {
    /// Create new bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create bounds for a strictly positive parameter.
    pub fn positive() -> Self {
        Self {
            min: 1e-10,
            max: f64::INFINITY,
        }
    }

    /// Create bounds for a non-negative parameter.
    pub fn non_negative() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    /// Create bounds for a parameter in [0, 1].
    pub fn unit_interval() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    /// Create unbounded.
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Whether neither side is finite.
    pub fn is_unbounded(&self) -> bool {
        !self.min.is_finite() && !self.max.is_finite()
    }

    /// Check if a value is within bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Smooth transform enforcing these bounds inside the solver.
    pub fn transform(&self) -> Result<ParameterTransform, SolverError> {
        ParameterTransform::from_bounds(self.min, self.max)
    }
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Split per-parameter bounds into lower and upper vectors.
pub fn split_bounds(bounds: &[ParameterBounds]) -> (Vec<f64>, Vec<f64>) {
    bounds.iter().map(|b| (b.min, b.max)).unzip()
}
