//! Static dispatch enum over covariance models.
//!
//! [`CovarianceModelEnum`] lets decorator chains be assembled at runtime
//! (from configuration, for instance) without `Box<dyn CovarianceModel>`.
//! Decorator variants box a decorator whose inner model is again a
//! `CovarianceModelEnum`, so chains nest to any depth and every call is a
//! `match`.
//!
//! ## Example
//!
//! ```
//! use pricer_core::types::{ParameterVector, TimeDiscretization};
//! use pricer_models::models::covariance::{
//!     ConstantCovarianceModel, CovarianceModel, CovarianceModelEnum,
//!     ParametricCovarianceModel,
//! };
//!
//! let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
//! let base = CovarianceModelEnum::from(ConstantCovarianceModel::new(grid.clone(), grid, 1, 1.0));
//! let chain = CovarianceModelEnum::displaced(base, 0.0, true)
//!     .blended(0.5, true);
//!
//! assert_eq!(chain.model_name(), "Blended");
//! assert_eq!(chain.parameters().to_scalars(), vec![0.0, 0.5]);
//!
//! let updated = chain
//!     .with_parameters(&ParameterVector::from_scalars(&[0.02, 0.1]))
//!     .unwrap();
//! assert_eq!(updated.parameters().to_scalars(), vec![0.02, 0.1]);
//! ```

use std::sync::Arc;

use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

use super::blended::BlendedCovarianceModel;
use super::constant::ConstantCovarianceModel;
use super::displaced::DisplacedCovarianceModel;
use super::exponential_form::ExponentialFormCovarianceModel;
use super::stochastic_volatility::StochasticVolatilityCovarianceModel;
use super::traits::{CovarianceModel, ParametricCovarianceModel};
use crate::simulation::BrownianMotion;

/// Any covariance model, base or decorated.
#[derive(Debug, Clone)]
pub enum CovarianceModelEnum {
    /// Constant loadings.
    Constant(ConstantCovarianceModel),
    /// Five-parameter exponential form.
    ExponentialForm(ExponentialFormCovarianceModel),
    /// Displaced-diffusion decorator.
    Displaced(Box<DisplacedCovarianceModel<CovarianceModelEnum>>),
    /// Log-normal/normal blend decorator.
    Blended(Box<BlendedCovarianceModel<CovarianceModelEnum>>),
    /// Stochastic-volatility decorator.
    StochasticVolatility(Box<StochasticVolatilityCovarianceModel<CovarianceModelEnum>>),
}

macro_rules! dispatch {
    ($self:expr, $model:ident => $body:expr) => {
        match $self {
            CovarianceModelEnum::Constant($model) => $body,
            CovarianceModelEnum::ExponentialForm($model) => $body,
            CovarianceModelEnum::Displaced($model) => $body,
            CovarianceModelEnum::Blended($model) => $body,
            CovarianceModelEnum::StochasticVolatility($model) => $body,
        }
    };
}

impl CovarianceModelEnum {
    /// Wrap `inner` in a displaced decorator.
    pub fn displaced(inner: CovarianceModelEnum, displacement: f64, calibratable: bool) -> Self {
        DisplacedCovarianceModel::new(inner, displacement, calibratable).into()
    }

    /// Wrap `self` in a blended decorator with reference level 1.
    pub fn blended(self, blend: f64, calibratable: bool) -> Self {
        BlendedCovarianceModel::new(self, blend, calibratable).into()
    }

    /// Wrap `self` in a stochastic-volatility decorator.
    pub fn with_stochastic_volatility(
        self,
        brownian: Arc<BrownianMotion>,
        kappa: f64,
        theta: f64,
        xi: f64,
        calibratable: bool,
    ) -> Self {
        StochasticVolatilityCovarianceModel::new(self, brownian, kappa, theta, xi, calibratable).into()
    }

    /// Whether this is a decorator variant.
    pub fn is_decorator(&self) -> bool {
        matches!(
            self,
            CovarianceModelEnum::Displaced(_)
                | CovarianceModelEnum::Blended(_)
                | CovarianceModelEnum::StochasticVolatility(_)
        )
    }
}

impl From<ConstantCovarianceModel> for CovarianceModelEnum {
    fn from(model: ConstantCovarianceModel) -> Self {
        CovarianceModelEnum::Constant(model)
    }
}

impl From<ExponentialFormCovarianceModel> for CovarianceModelEnum {
    fn from(model: ExponentialFormCovarianceModel) -> Self {
        CovarianceModelEnum::ExponentialForm(model)
    }
}

impl From<DisplacedCovarianceModel<CovarianceModelEnum>> for CovarianceModelEnum {
    fn from(model: DisplacedCovarianceModel<CovarianceModelEnum>) -> Self {
        CovarianceModelEnum::Displaced(Box::new(model))
    }
}

impl From<BlendedCovarianceModel<CovarianceModelEnum>> for CovarianceModelEnum {
    fn from(model: BlendedCovarianceModel<CovarianceModelEnum>) -> Self {
        CovarianceModelEnum::Blended(Box::new(model))
    }
}

impl From<StochasticVolatilityCovarianceModel<CovarianceModelEnum>> for CovarianceModelEnum {
    fn from(model: StochasticVolatilityCovarianceModel<CovarianceModelEnum>) -> Self {
        CovarianceModelEnum::StochasticVolatility(Box::new(model))
    }
}

impl CovarianceModel for CovarianceModelEnum {
    fn time_discretization(&self) -> &TimeDiscretization {
        dispatch!(self, m => m.time_discretization())
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        dispatch!(self, m => m.tenor_discretization())
    }

    fn num_factors(&self) -> usize {
        dispatch!(self, m => m.num_factors())
    }

    fn model_name(&self) -> &'static str {
        dispatch!(self, m => m.model_name())
    }

    fn num_components(&self) -> usize {
        dispatch!(self, m => m.num_components())
    }

    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        state: Option<&[RandomVariable]>,
    ) -> Option<Vec<RandomVariable>> {
        dispatch!(self, m => m.factor_loading(time_index, component, state))
    }

    fn factor_loading_pseudo_inverse(
        &self,
        time_index: usize,
        factor: usize,
        component: usize,
        state: Option<&[RandomVariable]>,
    ) -> Result<RandomVariable, ModelError> {
        dispatch!(self, m => m.factor_loading_pseudo_inverse(time_index, factor, component, state))
    }
}

impl ParametricCovarianceModel for CovarianceModelEnum {
    fn parameters(&self) -> ParameterVector {
        dispatch!(self, m => m.parameters())
    }

    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError> {
        Ok(match self {
            CovarianceModelEnum::Constant(m) => m.with_parameters(parameters)?.into(),
            CovarianceModelEnum::ExponentialForm(m) => m.with_parameters(parameters)?.into(),
            CovarianceModelEnum::Displaced(m) => m.with_parameters(parameters)?.into(),
            CovarianceModelEnum::Blended(m) => m.with_parameters(parameters)?.into(),
            CovarianceModelEnum::StochasticVolatility(m) => m.with_parameters(parameters)?.into(),
        })
    }
}
