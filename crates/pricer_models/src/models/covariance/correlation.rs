//! Exponential-decay correlation reduced to a factor model.

use std::sync::Arc;

use nalgebra::DMatrix;
use pricer_core::types::{ModelError, TimeDiscretization};

/// Correlation `ρ_ij = exp(−β·|T_i − T_j|)` between LIBOR periods, expressed
/// through `num_factors` factor loadings.
///
/// The full correlation matrix is reduced by principal components: the
/// loadings are `v_f[i]·√λ_f` for the `num_factors` largest eigenpairs, and
/// each row is renormalised to unit length so that the reduced matrix keeps
/// a unit diagonal. With as many factors as components the reduction is
/// exact. The sign of each eigenvector is fixed so that its first entry is
/// non-negative.
///
/// The decay rate enters through `|β|`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialDecayCorrelation {
    decay: f64,
    num_components: usize,
    num_factors: usize,
    /// Row-major `num_components × num_factors`.
    loadings: Arc<[f64]>,
}

impl ExponentialDecayCorrelation {
    /// Build the factor loadings for the periods of `tenor_discretization`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidParameter`] if `decay` is not finite or
    ///   `num_factors` is zero or exceeds the number of periods
    pub fn new(
        tenor_discretization: &TimeDiscretization,
        num_factors: usize,
        decay: f64,
    ) -> Result<Self, ModelError> {
        let num_components = tenor_discretization.num_time_steps();
        if !decay.is_finite() {
            return Err(ModelError::InvalidParameter(format!(
                "correlation decay must be finite, got {}",
                decay
            )));
        }
        if num_factors == 0 || num_factors > num_components {
            return Err(ModelError::InvalidParameter(format!(
                "number of factors {} must lie in 1..={}",
                num_factors, num_components
            )));
        }

        let beta = decay.abs();
        let times = tenor_discretization.as_slice();
        let correlation = DMatrix::from_fn(num_components, num_components, |i, j| {
            (-beta * (times[i] - times[j]).abs()).exp()
        });
        let eigen = correlation.symmetric_eigen();

        let mut order: Vec<usize> = (0..num_components).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let mut loadings = vec![0.0; num_components * num_factors];
        for (f, &k) in order.iter().take(num_factors).enumerate() {
            let scale = eigen.eigenvalues[k].max(0.0).sqrt();
            let column = eigen.eigenvectors.column(k);
            let sign = if column[0] < 0.0 { -1.0 } else { 1.0 };
            for i in 0..num_components {
                loadings[i * num_factors + f] = sign * column[i] * scale;
            }
        }
        for row in loadings.chunks_mut(num_factors) {
            let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|x| *x /= norm);
            }
        }

        Ok(Self {
            decay,
            num_components,
            num_factors,
            loadings: loadings.into(),
        })
    }

    /// Decay rate `β` as supplied.
    #[inline]
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Number of factors.
    #[inline]
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    /// Loading of `component` on `factor`.
    #[inline]
    pub fn factor_loading(&self, component: usize, factor: usize) -> f64 {
        self.loadings[component * self.num_factors + factor]
    }

    /// Correlation implied by the (reduced) loadings.
    pub fn correlation(&self, i: usize, j: usize) -> f64 {
        (0..self.num_factors)
            .map(|f| self.factor_loading(i, f) * self.factor_loading(j, f))
            .sum()
    }

    /// Number of components.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    #[cfg(test)]
    pub(crate) fn shared_loadings(&self) -> Arc<[f64]> {
        Arc::clone(&self.loadings)
    }
}
