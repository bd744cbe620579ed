//! Five-parameter exponential-form covariance model.

use pricer_core::types::{ModelError, ParameterVector, RandomVariable, TimeDiscretization};

use super::correlation::ExponentialDecayCorrelation;
use super::traits::{expect_len, scalar_parameter, CovarianceModel, ParametricCovarianceModel};
use super::volatility::MaturityDependentVolatility;

/// Number of free parameters: four volatility entries and one decay rate.
pub const EXPONENTIAL_FORM_PARAMETERS: usize = 5;

/// Volatility `(a + b·τ)·exp(−c·τ) + d` combined with an exponential-decay
/// correlation:
///
/// ```text
/// L_i[f](t) = σ_i(t) · B[i][f]
/// ```
///
/// Parameters are `[a, b, c, d, β]`.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{ParameterVector, TimeDiscretization};
/// use pricer_models::models::covariance::{
///     CovarianceModel, ExponentialFormCovarianceModel, ParametricCovarianceModel,
/// };
///
/// let times = TimeDiscretization::uniform(0.0, 10, 0.5).unwrap();
/// let tenor = TimeDiscretization::uniform(0.0, 10, 0.5).unwrap();
/// let model = ExponentialFormCovarianceModel::new(
///     times, tenor, 3, [0.1, 0.1, 0.5, 0.05, 0.2],
/// ).unwrap();
///
/// assert_eq!(model.parameters().len(), 5);
/// let bumped = model
///     .with_parameters(&ParameterVector::from_scalars(&[0.2, 0.1, 0.5, 0.05, 0.2]))
///     .unwrap();
/// let l0 = model.factor_loading(0, 4, None).unwrap();
/// let l1 = bumped.factor_loading(0, 4, None).unwrap();
/// assert!(l1[0].average().abs() > l0[0].average().abs());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFormCovarianceModel {
    time_discretization: TimeDiscretization,
    tenor_discretization: TimeDiscretization,
    volatility: MaturityDependentVolatility,
    correlation: ExponentialDecayCorrelation,
}

impl ExponentialFormCovarianceModel {
    /// Create the model with parameters `[a, b, c, d, β]`.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] for a non-finite parameter or a
    /// factor count outside `1..=num_components`.
    pub fn new(
        time_discretization: TimeDiscretization,
        tenor_discretization: TimeDiscretization,
        num_factors: usize,
        parameters: [f64; EXPONENTIAL_FORM_PARAMETERS],
    ) -> Result<Self, ModelError> {
        if let Some(p) = parameters.iter().find(|p| !p.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "exponential form parameter must be finite, got {}",
                p
            )));
        }
        let [a, b, c, d, decay] = parameters;
        let correlation = ExponentialDecayCorrelation::new(&tenor_discretization, num_factors, decay)?;
        let volatility = MaturityDependentVolatility::new(
            time_discretization.clone(),
            tenor_discretization.clone(),
            [a, b, c, d],
        );
        Ok(Self {
            time_discretization,
            tenor_discretization,
            volatility,
            correlation,
        })
    }

    /// Volatility sub-model.
    pub fn volatility_model(&self) -> &MaturityDependentVolatility {
        &self.volatility
    }

    /// Correlation sub-model.
    pub fn correlation_model(&self) -> &ExponentialDecayCorrelation {
        &self.correlation
    }
}

impl CovarianceModel for ExponentialFormCovarianceModel {
    fn time_discretization(&self) -> &TimeDiscretization {
        &self.time_discretization
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        &self.tenor_discretization
    }

    fn num_factors(&self) -> usize {
        self.correlation.num_factors()
    }

    fn model_name(&self) -> &'static str {
        "ExponentialForm"
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
        let vol = self.volatility.volatility(time_index, component);
        let time = self.time_discretization.time(time_index);
        Some(
            (0..self.num_factors())
                .map(|f| RandomVariable::deterministic(time, vol * self.correlation.factor_loading(component, f)))
                .collect(),
        )
    }
}

impl ParametricCovarianceModel for ExponentialFormCovarianceModel {
    fn parameters(&self) -> ParameterVector {
        let [a, b, c, d] = self.volatility.parameters();
        ParameterVector::from_scalars(&[a, b, c, d, self.correlation.decay()])
    }

    fn with_parameters(&self, parameters: &ParameterVector) -> Result<Self, ModelError> {
        expect_len(parameters, EXPONENTIAL_FORM_PARAMETERS)?;
        let mut values = [0.0; EXPONENTIAL_FORM_PARAMETERS];
        for (i, v) in values.iter_mut().enumerate() {
            *v = scalar_parameter(parameters, i, "exponential form parameter")?;
        }
        let [a, b, c, d, decay] = values;

        // Sub-models are rebuilt only when their own entries change.
        let volatility = if [a, b, c, d] != self.volatility.parameters() {
            MaturityDependentVolatility::new(
                self.time_discretization.clone(),
                self.tenor_discretization.clone(),
                [a, b, c, d],
            )
        } else {
            self.volatility.clone()
        };
        let correlation = if decay != self.correlation.decay() {
            ExponentialDecayCorrelation::new(&self.tenor_discretization, self.num_factors(), decay)?
        } else {
            self.correlation.clone()
        };

        Ok(Self {
            time_discretization: self.time_discretization.clone(),
            tenor_discretization: self.tenor_discretization.clone(),
            volatility,
            correlation,
        })
    }
}
