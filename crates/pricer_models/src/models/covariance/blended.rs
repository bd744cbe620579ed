//! Blend between log-normal and normal dynamics.

use std::fmt;
use std::sync::Arc;

use pricer_core::market_data::ForwardCurve;
use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

use super::marshal::{join_parameters, split_parameters};
use super::traits::{scalar_parameter, CovarianceModel, ParametricCovarianceModel};

/// Shared forward curve supplying the reference level of a blend.
pub type SharedForwardCurve = Arc<dyn ForwardCurve + Send + Sync>;

/// Scales the loadings of an inner model by a blend of the state and a
/// reference level `L₀`:
///
/// ```text
/// L'_i[f] = L_i[f] · (S_i·(1 − a) + a·L₀)
/// ```
///
/// `a = 0` is the log-normal limit and `a = 1` pins the scaling to `L₀`.
/// Without a forward curve `L₀ = 1`; with one,
/// `L₀ = forward(max(T_i − t, 0), T_{i+1} − T_i)`.
///
/// When no state is supplied, or the state has no entry for the component,
/// the inner loading is returned unchanged. The blend `a` is appended to the
/// inner parameters when calibratable.
#[derive(Clone)]
pub struct BlendedCovarianceModel<M> {
    inner: M,
    blend: RandomVariable,
    forward_curve: Option<SharedForwardCurve>,
    calibratable: bool,
}

impl<M: ParametricCovarianceModel> BlendedCovarianceModel<M> {
    /// Wrap `inner` with blend parameter `a` and reference level 1.
    pub fn new(inner: M, blend: f64, calibratable: bool) -> Self {
        Self {
            inner,
            blend: RandomVariable::constant(blend),
            forward_curve: None,
            calibratable,
        }
    }

    /// Take the reference level from a forward curve.
    pub fn with_forward_curve(mut self, curve: SharedForwardCurve) -> Self {
        self.forward_curve = Some(curve);
        self
    }

    /// Wrapped model.
    #[inline]
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Blend parameter `a`.
    #[inline]
    pub fn blend(&self) -> &RandomVariable {
        &self.blend
    }

    /// Whether `a` is a free parameter.
    #[inline]
    pub fn is_calibratable(&self) -> bool {
        self.calibratable
    }

    /// Reference level `L₀` of `component` at `time_index`.
    ///
    /// Returns `None` if the indices are off-grid or the curve rejects the
    /// lookup.
    pub fn reference_level(&self, time_index: usize, component: usize) -> Option<f64> {
        let Some(curve) = &self.forward_curve else {
            return Some(1.0);
        };
        let times = self.inner.time_discretization();
        let tenor = self.inner.tenor_discretization();
        if time_index >= times.num_times() || component >= tenor.num_time_steps() {
            return None;
        }
        let time_to_maturity = (tenor.time(component) - times.time(time_index)).max(0.0);
        curve
            .forward(time_to_maturity, tenor.time_step(component))
            .ok()
    }
}

impl<M: fmt::Debug> fmt::Debug for BlendedCovarianceModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlendedCovarianceModel")
            .field("inner", &self.inner)
            .field("blend", &self.blend)
            .field("forward_curve", &self.forward_curve.as_ref().map(|_| "<curve>"))
            .field("calibratable", &self.calibratable)
            .finish()
    }
}

impl<M: ParametricCovarianceModel> CovarianceModel for BlendedCovarianceModel<M> {
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
        "Blended"
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
        let loading = self.inner.factor_loading(time_index, component, state)?;
        let Some(level) = state.and_then(|s| s.get(component)) else {
            return Some(loading);
        };
        let reference = self.reference_level(time_index, component)?;
        let a = &self.blend;
        let scale = level
            .sub(&level.mult(a))
            .add(&a.mult_scalar(reference));
        loading.iter().map(|l| l.try_mult(&scale)).collect()
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

impl<M: ParametricCovarianceModel> ParametricCovarianceModel for BlendedCovarianceModel<M> {
    fn parameters(&self) -> ParameterVector {
        let own = ParameterVector::new(vec![self.blend.clone()]);
        join_parameters(&self.inner.parameters(), &own, self.calibratable)
    }

    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError> {
        let (inner_parameters, own) = split_parameters(parameters, 1, self.calibratable)?;
        let inner = self.inner.with_parameters(&inner_parameters)?;
        let blend = match own {
            Some(own) => {
                scalar_parameter(&own, 0, "blend")?;
                own[0].clone()
            }
            None => self.blend.clone(),
        };
        Ok(Self {
            inner,
            blend,
            forward_curve: self.forward_curve.clone(),
            calibratable: self.calibratable,
        })
    }
}
