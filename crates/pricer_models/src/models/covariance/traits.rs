//! Covariance model capability traits.

use nalgebra::DMatrix;
use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

/// Singular values below this threshold are treated as zero by the
/// default pseudo-inverse.
pub const PSEUDO_INVERSE_EPSILON: f64 = 1e-12;

/// Factor-loading generator of a LIBOR market model.
///
/// A covariance model maps `(time_index, component, state)` to the vector of
/// sensitivities of state component `component` to each of the
/// [`num_factors`](Self::num_factors) independent Brownian factors. The
/// `state` is the vector of LIBOR realisations at `time_index`, indexed by
/// component; `None` means no path state is available and all
/// state-dependent scaling is skipped.
///
/// Covariances and correlations follow from the loadings:
///
/// ```text
/// Cov_ij = Σ_f L_i[f] · L_j[f]
/// ```
pub trait CovarianceModel {
    /// Simulation time grid.
    fn time_discretization(&self) -> &TimeDiscretization;

    /// Tenor (LIBOR period) grid; component `i` is the period `[T_i, T_{i+1})`.
    fn tenor_discretization(&self) -> &TimeDiscretization;

    /// Number of independent driving factors.
    fn num_factors(&self) -> usize;

    /// Short identifier used in logs and errors.
    fn model_name(&self) -> &'static str;

    /// Number of state components (LIBOR periods).
    fn num_components(&self) -> usize {
        self.tenor_discretization().num_time_steps()
    }

    /// Factor loading of `component` at `time_index`.
    ///
    /// Returns `None` when the loading is unavailable: indices outside the
    /// model's grids, an auxiliary process that could not be simulated, or
    /// path-wise terms whose path counts disagree.
    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        state: Option<&[RandomVariable]>,
    ) -> Option<Vec<RandomVariable>>;

    /// Entry `(factor, component)` of the Moore-Penrose pseudo-inverse of the
    /// `components × factors` factor-loading matrix at `time_index`.
    ///
    /// The default implementation requires deterministic loadings.
    ///
    /// # Errors
    ///
    /// [`ModelError::UnsupportedOperation`] if a loading is stochastic or
    /// unavailable; decorators reject the operation outright.
    fn factor_loading_pseudo_inverse(
        &self,
        time_index: usize,
        factor: usize,
        component: usize,
        state: Option<&[RandomVariable]>,
    ) -> Result<RandomVariable, ModelError> {
        let n_components = self.num_components();
        let n_factors = self.num_factors();
        if factor >= n_factors || component >= n_components {
            return Err(ModelError::InvalidParameter(format!(
                "pseudo-inverse index ({}, {}) outside {}x{}",
                factor, component, n_factors, n_components
            )));
        }

        let mut loadings = DMatrix::<f64>::zeros(n_components, n_factors);
        for i in 0..n_components {
            let row = self.factor_loading(time_index, i, state).ok_or_else(|| {
                ModelError::unsupported(self.model_name(), "pseudo-inverse of unavailable loading")
            })?;
            for (f, value) in row.iter().enumerate().take(n_factors) {
                loadings[(i, f)] = value.as_deterministic().ok_or_else(|| {
                    ModelError::unsupported(self.model_name(), "pseudo-inverse of stochastic loading")
                })?;
            }
        }

        let inverse = loadings
            .pseudo_inverse(PSEUDO_INVERSE_EPSILON)
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        Ok(RandomVariable::constant(inverse[(factor, component)]))
    }

    /// Instantaneous covariance of components `i` and `j`.
    fn covariance(
        &self,
        time_index: usize,
        i: usize,
        j: usize,
        state: Option<&[RandomVariable]>,
    ) -> Option<RandomVariable> {
        let li = self.factor_loading(time_index, i, state)?;
        let lj = self.factor_loading(time_index, j, state)?;
        Some(
            li.iter()
                .zip(&lj)
                .fold(RandomVariable::constant(0.0), |acc, (a, b)| acc.add(&a.mult(b))),
        )
    }

    /// Instantaneous correlation of components `i` and `j`.
    fn correlation(
        &self,
        time_index: usize,
        i: usize,
        j: usize,
        state: Option<&[RandomVariable]>,
    ) -> Option<RandomVariable> {
        if i == j {
            return Some(RandomVariable::constant(1.0));
        }
        let cov = self.covariance(time_index, i, j, state)?;
        let var_i = self.covariance(time_index, i, i, state)?;
        let var_j = self.covariance(time_index, j, j, state)?;
        Some(cov.div(&var_i.mult(&var_j).sqrt()))
    }
}

/// A covariance model with a (possibly empty) vector of free parameters.
///
/// Models behave as immutable values: [`with_parameters`](Self::with_parameters)
/// returns a new instance and leaves `self` untouched. An empty
/// [`parameters`](Self::parameters) vector means the model is not
/// calibratable.
///
/// Round trip: `m.with_parameters(&m.parameters())` produces the same
/// factor loadings as `m`.
pub trait ParametricCovarianceModel: CovarianceModel + Clone {
    /// Current free parameters, in the model's documented order.
    fn parameters(&self) -> ParameterVector;

    /// Copy of this model with `parameters` substituted.
    ///
    /// # Errors
    ///
    /// [`ModelError::ParameterCount`] for a vector of the wrong length,
    /// [`ModelError::InvalidParameter`] for inadmissible values.
    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError>;
}

/// Check the length of a parameter vector.
pub(crate) fn expect_len(parameters: &ParameterVector, expected: usize) -> Result<(), ModelError> {
    if parameters.len() != expected {
        return Err(ModelError::ParameterCount {
            expected,
            got: parameters.len(),
        });
    }
    Ok(())
}

/// Deterministic value of a parameter entry, averaging stochastic entries.
pub(crate) fn scalar_parameter(parameters: &ParameterVector, i: usize, name: &str) -> Result<f64, ModelError> {
    let value = parameters[i].average();
    if !value.is_finite() {
        return Err(ModelError::InvalidParameter(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    Ok(value)
}
