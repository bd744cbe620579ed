//! Covariance model with a constant factor loading.

use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

use super::traits::{expect_len, scalar_parameter, CovarianceModel, ParametricCovarianceModel};

/// Every factor loading entry equals one fixed value.
///
/// Mostly useful as the innermost model of a decorator chain and in tests.
/// When calibratable, the single parameter is the loading value.
///
/// # Examples
///
/// ```
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::models::covariance::{
///     ConstantCovarianceModel, CovarianceModel, ParametricCovarianceModel,
/// };
///
/// let times = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
/// let tenor = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
/// let model = ConstantCovarianceModel::new(times, tenor, 2, 1.0);
///
/// let loading = model.factor_loading(0, 1, None).unwrap();
/// assert_eq!(loading.len(), 2);
/// assert_eq!(loading[0].as_deterministic(), Some(1.0));
/// assert!(model.parameters().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantCovarianceModel {
    time_discretization: TimeDiscretization,
    tenor_discretization: TimeDiscretization,
    num_factors: usize,
    value: f64,
    calibratable: bool,
}

impl ConstantCovarianceModel {
    /// Non-calibratable model with loading `value`.
    pub fn new(
        time_discretization: TimeDiscretization,
        tenor_discretization: TimeDiscretization,
        num_factors: usize,
        value: f64,
    ) -> Self {
        Self {
            time_discretization,
            tenor_discretization,
            num_factors,
            value,
            calibratable: false,
        }
    }

    /// Expose the loading value as a free parameter.
    pub fn calibratable(mut self, calibratable: bool) -> Self {
        self.calibratable = calibratable;
        self
    }

    /// Loading value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl CovarianceModel for ConstantCovarianceModel {
    fn time_discretization(&self) -> &TimeDiscretization {
        &self.time_discretization
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        &self.tenor_discretization
    }

    fn num_factors(&self) -> usize {
        self.num_factors
    }

    fn model_name(&self) -> &'static str {
        "Constant"
    }

    fn factor_loading(
        &self,
        time_index: usize,
        component: usize,
        _state: Option<&[RandomVariable]>,
    ) -> Option<Vec<RandomVariable>> {
        if time_index >= self.time_discretization.num_times() || component >= self.num_components() {
            return None;
        }
        Some(vec![RandomVariable::constant(self.value); self.num_factors])
    }
}

impl ParametricCovarianceModel for ConstantCovarianceModel {
    fn parameters(&self) -> ParameterVector {
        if self.calibratable {
            ParameterVector::from_scalars(&[self.value])
        } else {
            ParameterVector::empty()
        }
    }

    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError> {
        if !self.calibratable {
            expect_len(parameters, 0)?;
            return Ok(self.clone());
        }
        expect_len(parameters, 1)?;
        Ok(Self {
            value: scalar_parameter(parameters, 0, "loading value")?,
            ..self.clone()
        })
    }
}
