//! Square-root variance process driving the stochastic-volatility decorator.

use pricer_core::types::RandomVariable;

use crate::simulation::BrownianMotion;

/// Initial value of the variance process.
pub const INITIAL_VARIANCE: f64 = 1.0;

/// Mean-reverting square-root process
///
/// ```text
/// dV = κ(θ − V) dt + ξ √V dW,   V(0) = 1
/// ```
///
/// discretised by full-truncation Euler:
///
/// ```text
/// V_{n+1} = V_n + κ(θ − V_n)Δt + ξ √max(V_n, 0) ΔW_n
/// ```
///
/// Only the first factor of the driver is consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRootVarianceProcess {
    kappa: f64,
    theta: f64,
    xi: f64,
}

impl SquareRootVarianceProcess {
    /// Create the process with mean-reversion speed `kappa`, level `theta`
    /// and volatility of variance `xi`.
    pub fn new(kappa: f64, theta: f64, xi: f64) -> Self {
        Self { kappa, theta, xi }
    }

    /// Mean-reversion speed `κ`.
    #[inline]
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Mean-reversion level `θ`.
    #[inline]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Volatility of variance `ξ`.
    #[inline]
    pub fn xi(&self) -> f64 {
        self.xi
    }

    /// Simulate the process on the driver's grid.
    ///
    /// Simulation stops at the first step whose increment is missing or
    /// whose result is not finite; later time indices are then unavailable.
    pub fn simulate(&self, brownian: &BrownianMotion) -> VariancePaths {
        let grid = brownian.time_discretization();
        let mut values = Vec::with_capacity(grid.num_times());
        values.push(RandomVariable::deterministic(grid.first_time(), INITIAL_VARIANCE));

        for n in 0..grid.num_time_steps() {
            let Some(dw) = brownian.increment(n, 0) else {
                tracing::debug!(time_index = n, "variance process has no driving factor");
                break;
            };
            let dt = grid.time_step(n);
            let Some(current) = values.last() else {
                break;
            };
            let drift = current
                .mult_scalar(-1.0)
                .add_scalar(self.theta)
                .mult_scalar(self.kappa * dt);
            let diffusion = current.floor(0.0).sqrt().mult(dw).mult_scalar(self.xi);
            let next = current
                .add(&drift)
                .add(&diffusion)
                .with_filtration_time(grid.time(n + 1));
            if !next.is_finite() {
                tracing::debug!(time_index = n + 1, "variance process produced non-finite values");
                break;
            }
            values.push(next);
        }

        VariancePaths { values }
    }
}

/// Simulated variance values indexed by time.
#[derive(Debug, Clone, PartialEq)]
pub struct VariancePaths {
    values: Vec<RandomVariable>,
}

impl VariancePaths {
    /// Variance at `time_index`, or `None` if it was not simulated.
    #[inline]
    pub fn value(&self, time_index: usize) -> Option<&RandomVariable> {
        self.values.get(time_index)
    }

    /// Number of available time indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is available.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
