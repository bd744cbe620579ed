//! Smooth parameter transforms for bounded optimisation.
//!
//! The least-squares solver works on an unconstrained internal vector `y`
//! and maps each entry to the external (model) parameter `x = T(y)`:
//!
//! | Bounds | Transform |
//! |---|---|
//! | `(-∞, ∞)` | `x = y` |
//! | `[l, ∞)` | `x = l + softplus(y)` |
//! | `(-∞, u]` | `x = u - softplus(y)` |
//! | `[l, u]` | `x = l + (u - l)·logistic(y)` |
//!
//! Softplus and its inverse use the guarded form with a cutoff at 20, which
//! keeps `f64` arithmetic well conditioned for large arguments.

use crate::types::SolverError;

/// Smallest distance kept between a parameter and a finite bound when
/// mapping into the internal coordinates.
pub const BOUNDARY_MARGIN: f64 = 1e-12;

/// Numerically stable `ln(1 + exp(x))`.
#[inline]
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Inverse of [`safe_softplus`] on `(0, ∞)`.
#[inline]
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp_m1().ln()
    }
}

/// Logistic function `1 / (1 + exp(-x))` without overflow.
#[inline]
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Mapping between internal (unconstrained) and external (bounded)
/// coordinates for a single parameter.
///
/// # Examples
///
/// ```
/// use pricer_core::math::solvers::ParameterTransform;
///
/// let t = ParameterTransform::from_bounds(0.0, 1.0).unwrap();
/// let y = t.to_internal(0.25);
/// assert!((t.to_external(y) - 0.25).abs() < 1e-12);
/// assert!(t.to_external(1e6) <= 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterTransform {
    /// No bounds.
    Identity,
    /// Lower bound only.
    Lower(f64),
    /// Upper bound only.
    Upper(f64),
    /// Both bounds.
    Interval {
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },
}

impl ParameterTransform {
    /// Select the transform for the given bounds; infinite bounds are absent.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if either bound is NaN or
    /// `lower >= upper`.
    pub fn from_bounds(lower: f64, upper: f64) -> Result<Self, SolverError> {
        if lower.is_nan() || upper.is_nan() {
            return Err(SolverError::InvalidInput("NaN parameter bound".to_string()));
        }
        if lower >= upper {
            return Err(SolverError::InvalidInput(format!(
                "lower bound {} must be below upper bound {}",
                lower, upper
            )));
        }
        Ok(match (lower.is_finite(), upper.is_finite()) {
            (false, false) => ParameterTransform::Identity,
            (true, false) => ParameterTransform::Lower(lower),
            (false, true) => ParameterTransform::Upper(upper),
            (true, true) => ParameterTransform::Interval { lower, upper },
        })
    }

    /// Map an internal coordinate to the bounded parameter.
    #[inline]
    pub fn to_external(&self, y: f64) -> f64 {
        match *self {
            ParameterTransform::Identity => y,
            ParameterTransform::Lower(lower) => lower + safe_softplus(y),
            ParameterTransform::Upper(upper) => upper - safe_softplus(y),
            ParameterTransform::Interval { lower, upper } => lower + (upper - lower) * logistic(y),
        }
    }

    /// Map a parameter to its internal coordinate.
    ///
    /// Values on or outside a bound are first moved [`BOUNDARY_MARGIN`]
    /// inside it.
    pub fn to_internal(&self, x: f64) -> f64 {
        match *self {
            ParameterTransform::Identity => x,
            ParameterTransform::Lower(lower) => safe_softplus_inv((x - lower).max(BOUNDARY_MARGIN)),
            ParameterTransform::Upper(upper) => safe_softplus_inv((upper - x).max(BOUNDARY_MARGIN)),
            ParameterTransform::Interval { lower, upper } => {
                let u = ((x - lower) / (upper - lower)).clamp(BOUNDARY_MARGIN, 1.0 - BOUNDARY_MARGIN);
                (u / (1.0 - u)).ln()
            }
        }
    }

    /// Derivative `dx/dy` at the internal coordinate `y`.
    #[inline]
    pub fn derivative(&self, y: f64) -> f64 {
        match *self {
            ParameterTransform::Identity => 1.0,
            ParameterTransform::Lower(_) => logistic(y),
            ParameterTransform::Upper(_) => -logistic(y),
            ParameterTransform::Interval { lower, upper } => {
                let s = logistic(y);
                (upper - lower) * s * (1.0 - s)
            }
        }
    }

    /// Upper bound of the external parameter, if any.
    #[inline]
    pub fn upper(&self) -> Option<f64> {
        match *self {
            ParameterTransform::Upper(upper) | ParameterTransform::Interval { upper, .. } => {
                Some(upper)
            }
            _ => None,
        }
    }
}
