//! Calibration weights.

use pricer_core::types::CalibrationError;

/// Per-instrument weights applied before values reach the optimizer.
///
/// Values and targets are both multiplied by `√wᵢ`, so a least-squares
/// optimizer minimises `Σ wᵢ (vᵢ − tᵢ)²`. Unit weights (or an empty weight
/// slice) leave values untouched.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::calibration::ResidualWeights;
///
/// let weights = ResidualWeights::new(&[4.0, 1.0], 2).unwrap();
/// assert_eq!(weights.apply(vec![1.0, 3.0]), vec![2.0, 3.0]);
///
/// assert!(ResidualWeights::new(&[], 2).unwrap().is_unit());
/// assert!(ResidualWeights::new(&[1.0], 2).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualWeights {
    /// `√wᵢ`, or `None` for unit weights.
    scale: Option<Vec<f64>>,
}

impl ResidualWeights {
    /// Validate `weights` for `num_instruments` instruments.
    ///
    /// # Errors
    ///
    /// [`CalibrationError`] with kind `InvalidConfiguration` for a length
    /// other than 0 or `num_instruments`, or a negative or non-finite weight.
    pub fn new(weights: &[f64], num_instruments: usize) -> Result<Self, CalibrationError> {
        if weights.is_empty() {
            return Ok(Self::unit());
        }
        if weights.len() != num_instruments {
            return Err(CalibrationError::invalid_configuration(format!(
                "{} calibration weights for {} instruments",
                weights.len(),
                num_instruments
            )));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(CalibrationError::invalid_configuration(format!(
                "calibration weight {} must be finite and non-negative, got {}",
                i, w
            )));
        }
        if weights.iter().all(|&w| w == 1.0) {
            return Ok(Self::unit());
        }
        Ok(Self {
            scale: Some(weights.iter().map(|w| w.sqrt()).collect()),
        })
    }

    /// Unit weights.
    pub fn unit() -> Self {
        Self { scale: None }
    }

    /// Whether every weight is one.
    pub fn is_unit(&self) -> bool {
        self.scale.is_none()
    }

    /// Scale `values` by `√wᵢ`.
    pub fn apply(&self, mut values: Vec<f64>) -> Vec<f64> {
        if let Some(scale) = &self.scale {
            values.iter_mut().zip(scale).for_each(|(v, s)| *v *= s);
        }
        values
    }
}
