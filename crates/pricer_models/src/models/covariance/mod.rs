//! Parametric covariance models for LIBOR market models.
//!
//! A covariance model produces the factor loadings `L_i[f](t)` of each
//! LIBOR period `i` on each Brownian factor `f`. Models are values: a
//! calibration step produces a new model through
//! [`ParametricCovarianceModel::with_parameters`] and never mutates the
//! current one.
//!
//! ## Base models
//!
//! - [`ConstantCovarianceModel`]: every loading equals one value
//! - [`ExponentialFormCovarianceModel`]: maturity-dependent volatility times
//!   an exponential-decay correlation, five parameters
//!
//! ## Decorators
//!
//! Decorators wrap an inner model, rescale its loadings and append their own
//! parameter block to the inner parameters when that block is calibratable
//! (see [`join_parameters`] / [`split_parameters`]):
//!
//! | Decorator | Scaling | Own block |
//! |---|---|---|
//! | [`DisplacedCovarianceModel`] | `S_i + d` | `[d]` |
//! | [`BlendedCovarianceModel`] | `S_i(1 − a) + a·L₀` | `[a]` |
//! | [`StochasticVolatilityCovarianceModel`] | `√max(V(t), 0)` | `[κ, θ, ξ]` |
//!
//! Decorators do not provide a factor-loading pseudo-inverse.
//!
//! [`CovarianceModelEnum`] wraps all of the above for runtime-assembled
//! chains.

mod blended;
mod constant;
mod correlation;
mod displaced;
mod exponential_form;
mod marshal;
mod model_enum;
mod stochastic_volatility;
mod traits;
mod variance_process;
mod volatility;

pub use blended::{BlendedCovarianceModel, SharedForwardCurve};
pub use constant::ConstantCovarianceModel;
pub use correlation::ExponentialDecayCorrelation;
pub use displaced::DisplacedCovarianceModel;
pub use exponential_form::{ExponentialFormCovarianceModel, EXPONENTIAL_FORM_PARAMETERS};
pub use marshal::{join_parameters, split_parameters};
pub use model_enum::CovarianceModelEnum;
pub use stochastic_volatility::{
    StochasticVolatilityCovarianceModel, STOCHASTIC_VOLATILITY_PARAMETERS,
};
pub use traits::{CovarianceModel, ParametricCovarianceModel, PSEUDO_INVERSE_EPSILON};
pub use variance_process::{SquareRootVarianceProcess, VariancePaths, INITIAL_VARIANCE};
pub use volatility::MaturityDependentVolatility;
