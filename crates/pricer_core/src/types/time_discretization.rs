//! Strictly increasing time grids.
//!
//! [`TimeDiscretization`] is used both for the simulation time grid and for
//! the tenor (LIBOR period) grid of a term-structure model. Grids are shared
//! behind an `Arc` and never mutated, so clones alias the same storage.

use std::sync::Arc;

use super::error::ModelError;

/// Tolerance used when matching a time against a grid point.
pub const TIME_TOLERANCE: f64 = 1e-10;

/// Immutable, strictly increasing sequence of times.
///
/// # Examples
///
/// ```
/// use pricer_core::types::TimeDiscretization;
///
/// let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
/// assert_eq!(grid.num_times(), 5);
/// assert_eq!(grid.time(4), 2.0);
/// assert_eq!(grid.time_index(1.5), Some(3));
/// assert_eq!(grid.time_index_nearest_less_or_equal(1.7), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDiscretization {
    times: Arc<[f64]>,
}

impl TimeDiscretization {
    /// Build a grid from explicit times.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDiscretization`] if `times` is empty,
    /// contains non-finite values or is not strictly increasing.
    pub fn new(times: Vec<f64>) -> Result<Self, ModelError> {
        if times.is_empty() {
            return Err(ModelError::InvalidDiscretization(
                "time grid must contain at least one point".to_string(),
            ));
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(ModelError::InvalidDiscretization(format!(
                "non-finite time {}",
                t
            )));
        }
        if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ModelError::InvalidDiscretization(format!(
                "times must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }
        Ok(Self {
            times: times.into(),
        })
    }

    /// Build a uniform grid `start, start + dt, ..., start + n_steps·dt`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDiscretization`] if `dt` is not positive.
    pub fn uniform(start: f64, n_steps: usize, dt: f64) -> Result<Self, ModelError> {
        if dt.is_nan() || dt <= 0.0 {
            return Err(ModelError::InvalidDiscretization(format!(
                "time step must be positive, got {}",
                dt
            )));
        }
        Self::new((0..=n_steps).map(|i| start + i as f64 * dt).collect())
    }

    /// Time at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_times()`.
    #[inline]
    pub fn time(&self, i: usize) -> f64 {
        self.times[i]
    }

    /// Number of grid points.
    #[inline]
    pub fn num_times(&self) -> usize {
        self.times.len()
    }

    /// Number of intervals between grid points.
    #[inline]
    pub fn num_time_steps(&self) -> usize {
        self.times.len() - 1
    }

    /// Length of the interval starting at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_time_steps()`.
    #[inline]
    pub fn time_step(&self, i: usize) -> f64 {
        self.times[i + 1] - self.times[i]
    }

    /// First grid point.
    #[inline]
    pub fn first_time(&self) -> f64 {
        self.times[0]
    }

    /// Last grid point.
    #[inline]
    pub fn last_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Index of the grid point equal to `t` within [`TIME_TOLERANCE`].
    pub fn time_index(&self, t: f64) -> Option<usize> {
        let i = self.times.partition_point(|&x| x < t - TIME_TOLERANCE);
        (i < self.times.len() && (self.times[i] - t).abs() <= TIME_TOLERANCE).then_some(i)
    }

    /// Index of the last grid point not after `t`.
    ///
    /// Returns `None` when `t` precedes the first grid point.
    pub fn time_index_nearest_less_or_equal(&self, t: f64) -> Option<usize> {
        let i = self.times.partition_point(|&x| x <= t + TIME_TOLERANCE);
        i.checked_sub(1)
    }

    /// All grid points.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }
}
