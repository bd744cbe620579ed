//! Displaced-diffusion decorator.

use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

use super::marshal::{join_parameters, split_parameters};
use super::traits::{scalar_parameter, CovarianceModel, ParametricCovarianceModel};

/// Scales the loadings of an inner model by the displaced state:
///
/// ```text
/// L'_i[f] = L_i[f] · (S_i + d)
/// ```
///
/// When no state is supplied, or the state has no entry for the component,
/// the inner loading is returned unchanged.
///
/// The displacement `d` is appended to the inner parameters when
/// calibratable.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{RandomVariable, TimeDiscretization};
/// use pricer_models::models::covariance::{
///     ConstantCovarianceModel, CovarianceModel, DisplacedCovarianceModel,
///     ParametricCovarianceModel,
/// };
///
/// let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
/// let base = ConstantCovarianceModel::new(grid.clone(), grid, 1, 1.0);
/// let model = DisplacedCovarianceModel::new(base, 0.03, true);
///
/// let state = vec![RandomVariable::constant(0.05); 4];
/// let loading = model.factor_loading(0, 2, Some(&state[..])).unwrap();
/// assert!((loading[0].average() - 0.08).abs() < 1e-15);
/// assert_eq!(model.parameters().to_scalars(), vec![0.03]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacedCovarianceModel<M> {
    inner: M,
    displacement: RandomVariable,
    calibratable: bool,
}

impl<M: ParametricCovarianceModel> DisplacedCovarianceModel<M> {
    /// Wrap `inner` with a scalar displacement.
    pub fn new(inner: M, displacement: f64, calibratable: bool) -> Self {
        Self::with_displacement(inner, RandomVariable::constant(displacement), calibratable)
    }

    /// Wrap `inner` with a possibly path-dependent displacement.
    pub fn with_displacement(inner: M, displacement: RandomVariable, calibratable: bool) -> Self {
        Self {
            inner,
            displacement,
            calibratable,
        }
    }

    /// Wrapped model.
    #[inline]
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Displacement `d`.
    #[inline]
    pub fn displacement(&self) -> &RandomVariable {
        &self.displacement
    }

    /// Whether `d` is a free parameter.
    #[inline]
    pub fn is_calibratable(&self) -> bool {
        self.calibratable
    }
}

impl<M: ParametricCovarianceModel> CovarianceModel for DisplacedCovarianceModel<M> {
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
        "Displaced"
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
        let scale = level.add(&self.displacement);
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

impl<M: ParametricCovarianceModel> ParametricCovarianceModel for DisplacedCovarianceModel<M> {
    fn parameters(&self) -> ParameterVector {
        let own = ParameterVector::new(vec![self.displacement.clone()]);
        join_parameters(&self.inner.parameters(), &own, self.calibratable)
    }

    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError> {
        let (inner_parameters, own) = split_parameters(parameters, 1, self.calibratable)?;
        let inner = self.inner.with_parameters(&inner_parameters)?;
        let displacement = match own {
            Some(own) => {
                scalar_parameter(&own, 0, "displacement")?;
                own[0].clone()
            }
            None => self.displacement.clone(),
        };
        Ok(Self {
            inner,
            displacement,
            calibratable: self.calibratable,
        })
    }
}
