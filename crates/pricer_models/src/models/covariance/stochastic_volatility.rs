//! Heston-style stochastic-volatility decorator.
//!
//! The decorator scales an inner model's loadings by `√max(V(t), 0)`, where
//! `V` is a [`SquareRootVarianceProcess`] driven by the first factor of a
//! shared [`BrownianMotion`].
//!
//! The simulated variance paths are built on first use and cached per
//! instance behind a mutex, so concurrent callers trigger at most one
//! simulation. Replacing `κ`, `θ` or `ξ` through
//! [`with_parameters`](ParametricCovarianceModel::with_parameters) yields a
//! model whose cache starts empty; the original instance keeps its own.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

use super::marshal::{join_parameters, split_parameters};
use super::traits::{scalar_parameter, CovarianceModel, ParametricCovarianceModel};
use super::variance_process::{SquareRootVarianceProcess, VariancePaths};
use crate::simulation::BrownianMotion;

/// Number of own parameters: `κ`, `θ`, `ξ`.
pub const STOCHASTIC_VOLATILITY_PARAMETERS: usize = 3;

/// Stochastic-volatility decorator.
///
/// Parameters are the inner parameters followed by `[κ, θ, ξ]` when
/// calibratable.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::models::covariance::{
///     ConstantCovarianceModel, CovarianceModel, StochasticVolatilityCovarianceModel,
/// };
/// use pricer_models::simulation::BrownianMotion;
///
/// let grid = TimeDiscretization::uniform(0.0, 8, 0.25).unwrap();
/// let base = ConstantCovarianceModel::new(grid.clone(), grid.clone(), 1, 0.2);
/// let driver = Arc::new(BrownianMotion::new(grid, 2, 1000, 42).unwrap());
/// let model = StochasticVolatilityCovarianceModel::new(base, driver, 1.0, 1.0, 0.3, true);
///
/// // V(0) = 1, so the first loading is unscaled.
/// let loading = model.factor_loading(0, 3, None).unwrap();
/// assert_eq!(loading[0].average(), 0.2);
/// ```
pub struct StochasticVolatilityCovarianceModel<M> {
    inner: M,
    brownian: Arc<BrownianMotion>,
    process: SquareRootVarianceProcess,
    calibratable: bool,
    cache: Mutex<Option<Arc<VariancePaths>>>,
}

impl<M: ParametricCovarianceModel> StochasticVolatilityCovarianceModel<M> {
    /// Wrap `inner` with variance dynamics `(κ, θ, ξ)` driven by `brownian`.
    pub fn new(
        inner: M,
        brownian: Arc<BrownianMotion>,
        kappa: f64,
        theta: f64,
        xi: f64,
        calibratable: bool,
    ) -> Self {
        Self {
            inner,
            brownian,
            process: SquareRootVarianceProcess::new(kappa, theta, xi),
            calibratable,
            cache: Mutex::new(None),
        }
    }

    /// Wrapped model.
    #[inline]
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Variance dynamics.
    #[inline]
    pub fn process(&self) -> &SquareRootVarianceProcess {
        &self.process
    }

    /// Brownian driver of the variance process.
    #[inline]
    pub fn brownian_motion(&self) -> &Arc<BrownianMotion> {
        &self.brownian
    }

    /// Whether `(κ, θ, ξ)` are free parameters.
    #[inline]
    pub fn is_calibratable(&self) -> bool {
        self.calibratable
    }

    /// Simulated variance paths, built on first call.
    pub fn variance_paths(&self) -> Arc<VariancePaths> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(paths) = cache.as_ref() {
            return Arc::clone(paths);
        }
        tracing::debug!(
            kappa = self.process.kappa(),
            theta = self.process.theta(),
            xi = self.process.xi(),
            seed = self.brownian.seed(),
            "building auxiliary variance process"
        );
        let paths = Arc::new(self.process.simulate(&self.brownian));
        *cache = Some(Arc::clone(&paths));
        paths
    }

    /// Whether the variance paths have been built.
    pub fn is_cached(&self) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn cached(&self) -> Option<Arc<VariancePaths>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<M: Clone> Clone for StochasticVolatilityCovarianceModel<M> {
    fn clone(&self) -> Self {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            inner: self.inner.clone(),
            brownian: Arc::clone(&self.brownian),
            process: self.process,
            calibratable: self.calibratable,
            cache: Mutex::new(cached),
        }
    }
}

impl<M: PartialEq> PartialEq for StochasticVolatilityCovarianceModel<M> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
            && Arc::ptr_eq(&self.brownian, &other.brownian)
            && self.process == other.process
            && self.calibratable == other.calibratable
    }
}

impl<M: fmt::Debug> fmt::Debug for StochasticVolatilityCovarianceModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StochasticVolatilityCovarianceModel")
            .field("inner", &self.inner)
            .field("process", &self.process)
            .field("seed", &self.brownian.seed())
            .field("calibratable", &self.calibratable)
            .finish_non_exhaustive()
    }
}

impl<M: ParametricCovarianceModel> CovarianceModel for StochasticVolatilityCovarianceModel<M> {
    fn time_discretization(&self) -> &TimeDiscretization {
        self.inner.time_discretization()
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        self.inner.tenor_discretization()
    }

    fn num_factors(&self) -> usize {
        self.inner.num_factors()
    }

    fn model_name(&self) -> &'static str {
        "StochasticVolatility"
    }

    fn num_components(&self) -> usize {
        self.inner.num_components()
    }

    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        state: Option<&[RandomVariable]>,
    ) -> Option<Vec<RandomVariable>> {
        let paths = self.variance_paths();
        let scaling = paths.value(time_index)?.floor(0.0).sqrt();
        let loading = self.inner.factor_loading(time_index, component, state)?;
        loading.iter().map(|l| l.try_mult(&scaling)).collect()
    }

    fn factor_loading_pseudo_inverse(
        &self,
        _time_index: usize,
        _factor: usize,
        _component: usize,
        _state: Option<&[RandomVariable]>,
    ) -> Result<RandomVariable, ModelError> {
        Err(ModelError::unsupported(self.model_name(), "factor loading pseudo-inverse"))
    }
}

impl<M: ParametricCovarianceModel> ParametricCovarianceModel for StochasticVolatilityCovarianceModel<M> {
    fn parameters(&self) -> ParameterVector {
        let own = ParameterVector::from_scalars(&[
            self.process.kappa(),
            self.process.theta(),
            self.process.xi(),
        ]);
        join_parameters(&self.inner.parameters(), &own, self.calibratable)
    }

    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError> {
        let (inner_parameters, own) =
            split_parameters(parameters, STOCHASTIC_VOLATILITY_PARAMETERS, self.calibratable)?;
        let inner = self.inner.with_parameters(&inner_parameters)?;
        let process = match own {
            Some(own) => SquareRootVarianceProcess::new(
                scalar_parameter(&own, 0, "kappa")?,
                scalar_parameter(&own, 1, "theta")?,
                scalar_parameter(&own, 2, "xi")?,
            ),
            None => self.process,
        };
        let cache = if process == self.process {
            self.cached()
        } else {
            None
        };
        Ok(Self {
            inner,
            brownian: Arc::clone(&self.brownian),
            process,
            calibratable: self.calibratable,
            cache: Mutex::new(cache),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::covariance::ConstantCovarianceModel;
    use approx::assert_relative_eq;
    use std::thread;

    fn grid() -> TimeDiscretization {
        TimeDiscretization::uniform(0.0, 8, 0.25).unwrap()
    }

    fn model(calibratable: bool) -> StochasticVolatilityCovarianceModel<ConstantCovarianceModel> {
        let base = ConstantCovarianceModel::new(grid(), grid(), 2, 0.3);
        let driver = Arc::new(BrownianMotion::new(grid(), 2, 500, 7).unwrap());
        StochasticVolatilityCovarianceModel::new(base, driver, 1.2, 0.8, 0.4, calibratable)
    }

    #[test]
    fn test_first_time_index_is_unscaled() {
        let m = model(true);
        let loading = m.factor_loading(0, 1, None).unwrap();
        assert_eq!(loading, m.inner().factor_loading(0, 1, None).unwrap());
    }

    #[test]
    fn test_later_loadings_scaled_by_root_variance() {
        let m = model(true);
        let v = m.variance_paths().value(3).unwrap().clone();
        let loading = m.factor_loading(3, 2, None).unwrap();
        for path in [0, 17, 499] {
            assert_relative_eq!(
                loading[1].realization(path),
                0.3 * v.realization(path).max(0.0).sqrt(),
                epsilon = 1e-15
            );
        }
    }

    #[test]
    fn test_cache_is_lazy_and_shared_by_clones() {
        let m = model(true);
        assert!(!m.is_cached());
        let _ = m.factor_loading(1, 0, None);
        assert!(m.is_cached());
        let c = m.clone();
        assert!(c.is_cached());
        assert!(Arc::ptr_eq(&m.variance_paths(), &c.variance_paths()));
    }

    #[test]
    fn test_parameter_change_invalidates_cache() {
        let m = model(true);
        let _ = m.variance_paths();

        let same = m.with_parameters(&m.parameters()).unwrap();
        assert!(same.is_cached());

        let changed = m
            .with_parameters(&ParameterVector::from_scalars(&[2.0, 0.8, 0.4]))
            .unwrap();
        assert!(!changed.is_cached());
        assert!(m.is_cached());
        assert_eq!(changed.process().kappa(), 2.0);
    }

    #[test]
    fn test_concurrent_access_builds_once() {
        let m = model(true);
        let paths: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| m.variance_paths())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for p in &paths[1..] {
            assert!(Arc::ptr_eq(&paths[0], p));
        }
    }

    #[test]
    fn test_unavailable_variance_propagates_as_none() {
        let m = model(true);
        assert!(m.factor_loading(9, 0, None).is_none());

        let base = ConstantCovarianceModel::new(grid(), grid(), 1, 0.3);
        let no_factor = Arc::new(BrownianMotion::new(grid(), 0, 10, 7).unwrap());
        let m = StochasticVolatilityCovarianceModel::new(base, no_factor, 1.0, 1.0, 0.1, false);
        assert!(m.factor_loading(0, 0, None).is_some());
        assert!(m.factor_loading(1, 0, None).is_none());
    }

    #[test]
    fn test_parameter_layout() {
        let m = model(true);
        assert_eq!(m.parameters().to_scalars(), vec![1.2, 0.8, 0.4]);
        assert!(model(false).parameters().is_empty());
        assert!(m.with_parameters(&ParameterVector::from_scalars(&[1.0, 2.0])).is_err());
    }
}
