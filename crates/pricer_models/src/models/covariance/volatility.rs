//! Maturity-dependent instantaneous volatility.

use pricer_core::types::TimeDiscretization;

/// Four-parameter volatility as a function of time to maturity:
///
/// ```text
/// σ_i(t) = (a + b·τ)·exp(−c·τ) + d,   τ = T_i − t
/// ```
///
/// with `σ_i(t) = 0` once the period has fixed (`τ < 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct MaturityDependentVolatility {
    time_discretization: TimeDiscretization,
    tenor_discretization: TimeDiscretization,
    parameters: [f64; 4],
}

impl MaturityDependentVolatility {
    /// Create the volatility model with parameters `[a, b, c, d]`.
    pub fn new(
        time_discretization: TimeDiscretization,
        tenor_discretization: TimeDiscretization,
        parameters: [f64; 4],
    ) -> Self {
        Self {
            time_discretization,
            tenor_discretization,
            parameters,
        }
    }

    /// Parameters `[a, b, c, d]`.
    #[inline]
    pub fn parameters(&self) -> [f64; 4] {
        self.parameters
    }

    /// Volatility of `component` at `time_index`.
    ///
    /// Indices must lie inside the model's grids.
    pub fn volatility(&self, time_index: usize, component: usize) -> f64 {
        let [a, b, c, d] = self.parameters;
        let tau = self.tenor_discretization.time(component) - self.time_discretization.time(time_index);
        if tau < 0.0 {
            return 0.0;
        }
        (a + b * tau) * (-c * tau).exp() + d
    }
}
