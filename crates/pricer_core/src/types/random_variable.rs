//! Path-wise random variables.
//!
//! A [`RandomVariable`] is either deterministic (a single scalar shared by
//! all paths) or stochastic (one realisation per Monte Carlo path). Binary
//! operations broadcast a deterministic operand across the paths of a
//! stochastic one.
//!
//! Realisations are stored behind an `Arc<[f64]>`, so cloning is cheap and
//! values are never mutated after construction.
//!
//! # Example
//!
//! ```
//! use pricer_core::types::RandomVariable;
//!
//! let x = RandomVariable::from_realizations(0.0, vec![1.0, 4.0, 9.0]);
//! let y = x.sqrt().mult_scalar(2.0);
//! assert_eq!(y.realization(1), 4.0);
//! assert!((y.average() - 4.0).abs() < 1e-12);
//! ```

use std::ops::{Add, Mul, Sub};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Realizations {
    Deterministic(f64),
    Stochastic(Arc<[f64]>),
}

/// A scalar or path-wise stochastic value observed at a filtration time.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
    filtration_time: f64,
    realizations: Realizations,
}

impl RandomVariable {
    /// Create a deterministic value at filtration time zero.
    #[inline]
    pub fn constant(value: f64) -> Self {
        Self::deterministic(0.0, value)
    }

    /// Create a deterministic value at the given filtration time.
    #[inline]
    pub fn deterministic(filtration_time: f64, value: f64) -> Self {
        Self {
            filtration_time,
            realizations: Realizations::Deterministic(value),
        }
    }

    /// Create a stochastic value from per-path realisations.
    ///
    /// A single realisation collapses to a deterministic value.
    pub fn from_realizations(filtration_time: f64, values: Vec<f64>) -> Self {
        if values.len() == 1 {
            return Self::deterministic(filtration_time, values[0]);
        }
        Self {
            filtration_time,
            realizations: Realizations::Stochastic(values.into()),
        }
    }

    /// Filtration time of this value.
    #[inline]
    pub fn filtration_time(&self) -> f64 {
        self.filtration_time
    }

    /// Same realisations observed at another filtration time.
    #[inline]
    pub fn with_filtration_time(&self, filtration_time: f64) -> Self {
        Self {
            filtration_time,
            realizations: self.realizations.clone(),
        }
    }

    /// Whether all paths share one value.
    #[inline]
    pub fn is_deterministic(&self) -> bool {
        matches!(self.realizations, Realizations::Deterministic(_))
    }

    /// Number of stored realisations (1 for deterministic values).
    #[inline]
    pub fn size(&self) -> usize {
        match &self.realizations {
            Realizations::Deterministic(_) => 1,
            Realizations::Stochastic(values) => values.len(),
        }
    }

    /// Realisation on the given path; deterministic values ignore the index.
    ///
    /// # Panics
    ///
    /// Panics if `path` is out of range for a stochastic value.
    #[inline]
    pub fn realization(&self, path: usize) -> f64 {
        match &self.realizations {
            Realizations::Deterministic(value) => *value,
            Realizations::Stochastic(values) => values[path],
        }
    }

    /// Deterministic value, if this variable has one.
    #[inline]
    pub fn as_deterministic(&self) -> Option<f64> {
        match &self.realizations {
            Realizations::Deterministic(value) => Some(*value),
            Realizations::Stochastic(_) => None,
        }
    }

    /// Expectation over paths.
    pub fn average(&self) -> f64 {
        match &self.realizations {
            Realizations::Deterministic(value) => *value,
            Realizations::Stochastic(values) => {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
    }

    /// Minimum over paths.
    pub fn min(&self) -> f64 {
        match &self.realizations {
            Realizations::Deterministic(value) => *value,
            Realizations::Stochastic(values) => {
                values.iter().copied().fold(f64::INFINITY, f64::min)
            }
        }
    }

    /// Maximum over paths.
    pub fn max(&self) -> f64 {
        match &self.realizations {
            Realizations::Deterministic(value) => *value,
            Realizations::Stochastic(values) => {
                values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            }
        }
    }

    /// Whether every realisation is finite.
    pub fn is_finite(&self) -> bool {
        match &self.realizations {
            Realizations::Deterministic(value) => value.is_finite(),
            Realizations::Stochastic(values) => values.iter().all(|v| v.is_finite()),
        }
    }

    /// Apply a function path-wise.
    pub fn apply(&self, f: impl Fn(f64) -> f64) -> Self {
        let realizations = match &self.realizations {
            Realizations::Deterministic(value) => Realizations::Deterministic(f(*value)),
            Realizations::Stochastic(values) => {
                Realizations::Stochastic(values.iter().map(|&v| f(v)).collect())
            }
        };
        Self {
            filtration_time: self.filtration_time,
            realizations,
        }
    }

    /// Combine two values path-wise, broadcasting deterministic operands.
    ///
    /// # Panics
    ///
    /// Panics if both operands are stochastic with different path counts.
    pub fn combine(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let filtration_time = self.filtration_time.max(other.filtration_time);
        let realizations = match (&self.realizations, &other.realizations) {
            (Realizations::Deterministic(a), Realizations::Deterministic(b)) => {
                Realizations::Deterministic(f(*a, *b))
            }
            (Realizations::Deterministic(a), Realizations::Stochastic(b)) => {
                Realizations::Stochastic(b.iter().map(|&y| f(*a, y)).collect())
            }
            (Realizations::Stochastic(a), Realizations::Deterministic(b)) => {
                Realizations::Stochastic(a.iter().map(|&x| f(x, *b)).collect())
            }
            (Realizations::Stochastic(a), Realizations::Stochastic(b)) => {
                assert_eq!(a.len(), b.len(), "path count mismatch");
                Realizations::Stochastic(a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect())
            }
        };
        Self {
            filtration_time,
            realizations,
        }
    }

    /// Whether `self` and `other` can be combined path-wise: at least one is
    /// deterministic or both carry the same number of paths.
    #[inline]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.is_deterministic() || other.is_deterministic() || self.size() == other.size()
    }

    /// Path-wise product, or `None` on a path count mismatch.
    #[inline]
    pub fn try_mult(&self, other: &Self) -> Option<Self> {
        self.is_compatible_with(other).then(|| self.mult(other))
    }

    /// Path-wise sum.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a + b)
    }

    /// Path-wise difference.
    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a - b)
    }

    /// Path-wise product.
    #[inline]
    pub fn mult(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a * b)
    }

    /// Path-wise quotient.
    #[inline]
    pub fn div(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a / b)
    }

    /// Add a scalar.
    #[inline]
    pub fn add_scalar(&self, value: f64) -> Self {
        self.apply(|x| x + value)
    }

    /// Multiply by a scalar.
    #[inline]
    pub fn mult_scalar(&self, value: f64) -> Self {
        self.apply(|x| x * value)
    }

    /// Path-wise square root.
    #[inline]
    pub fn sqrt(&self) -> Self {
        self.apply(f64::sqrt)
    }

    /// Path-wise `max(x, floor)`.
    #[inline]
    pub fn floor(&self, floor: f64) -> Self {
        self.apply(|x| x.max(floor))
    }

    /// Path-wise `min(x, cap)`.
    #[inline]
    pub fn cap(&self, cap: f64) -> Self {
        self.apply(|x| x.min(cap))
    }
}

impl From<f64> for RandomVariable {
    fn from(value: f64) -> Self {
        RandomVariable::constant(value)
    }
}

impl Add for &RandomVariable {
    type Output = RandomVariable;

    fn add(self, rhs: Self) -> RandomVariable {
        RandomVariable::add(self, rhs)
    }
}

impl Sub for &RandomVariable {
    type Output = RandomVariable;

    fn sub(self, rhs: Self) -> RandomVariable {
        RandomVariable::sub(self, rhs)
    }
}

impl Mul for &RandomVariable {
    type Output = RandomVariable;

    fn mul(self, rhs: Self) -> RandomVariable {
        RandomVariable::mult(self, rhs)
    }
}
