//! Error types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: Errors from instrument valuation
//! - `SolverError`: Errors from the least-squares optimizer
//! - `ModelError`: Errors from covariance models and their parameter marshaling
//! - `CalibrationError`: Errors surfaced by a calibration run

use std::fmt;
use thiserror::Error;

/// Categorised pricing errors.
///
/// Returned by calibration instruments when a valuation cannot be produced.
/// During calibration these errors are recovered locally and never surface
/// to the caller.
///
/// # Examples
/// ```
/// use pricer_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("Negative notional".to_string());
/// assert_eq!(format!("{}", err), "Invalid input: Negative notional");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Invalid input data or parameters
    InvalidInput(String),

    /// Numerical instability during computation
    NumericalInstability(String),

    /// Model failed to produce valid result
    ModelFailure(String),

    /// Instrument type not supported
    UnsupportedInstrument(String),
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PricingError::NumericalInstability(msg) => {
                write!(f, "Numerical instability: {}", msg)
            }
            PricingError::ModelFailure(msg) => write!(f, "Model failure: {}", msg),
            PricingError::UnsupportedInstrument(msg) => {
                write!(f, "Unsupported instrument: {}", msg)
            }
        }
    }
}

impl std::error::Error for PricingError {}

/// Optimizer and solver errors.
///
/// # Examples
/// ```
/// use pricer_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    ///
    /// The built-in Levenberg-Marquardt solver reports an exhausted
    /// iteration budget through its result instead; this variant is for
    /// optimizers that treat it as an error.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// Numerical instability during computation (singular update, NaN values).
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Inconsistent problem definition (lengths, empty vectors, bad bounds).
    #[error("Invalid solver input: {0}")]
    InvalidInput(String),

    /// The objective function could not be evaluated.
    #[error("Objective function failed: {0}")]
    ObjectiveFailure(String),
}

/// Covariance model errors.
///
/// # Examples
/// ```
/// use pricer_core::types::ModelError;
///
/// let err = ModelError::ParameterCount { expected: 3, got: 2 };
/// assert!(format!("{}", err).contains("expected 3"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelError {
    /// The requested operation is not supported by this model.
    #[error("Operation not supported by {model}: {operation}")]
    UnsupportedOperation {
        /// Model name
        model: String,
        /// Operation name
        operation: String,
    },

    /// Parameter vector has the wrong length.
    #[error("Parameter count mismatch: expected {expected}, got {got}")]
    ParameterCount {
        /// Number of entries the model requires
        expected: usize,
        /// Number of entries supplied
        got: usize,
    },

    /// A parameter value is outside its admissible domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Time or tenor grid is unusable.
    #[error("Invalid discretization: {0}")]
    InvalidDiscretization(String),
}

impl ModelError {
    /// Create an unsupported-operation error.
    pub fn unsupported(model: &str, operation: &str) -> Self {
        ModelError::UnsupportedOperation {
            model: model.to_string(),
            operation: operation.to_string(),
        }
    }
}

/// Calibration error kind.
///
/// # Variants
/// - `SolverFailure`: The optimizer raised a solver-level failure
/// - `NotConverged`: Calibration failed to converge within iteration limit
/// - `InvalidConfiguration`: Options, weights or instrument sets are inconsistent
/// - `InsufficientData`: Not enough calibration instruments
/// - `InvalidParameter`: The model rejected a parameter vector
/// - `SimulationFailure`: The trial simulation could not be built
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationErrorKind {
    /// The optimizer failed.
    #[error("solver failure")]
    SolverFailure,

    /// Calibration did not converge within iteration limit.
    #[error("calibration did not converge")]
    NotConverged,

    /// Inconsistent calibration setup.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Insufficient market data for calibration.
    #[error("insufficient data: need at least {need} points, got {got}")]
    InsufficientData {
        /// Number of data points provided.
        got: usize,
        /// Minimum required data points.
        need: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Trial simulation could not be constructed.
    #[error("simulation failure: {0}")]
    SimulationFailure(String),
}

/// Calibration error with detailed diagnostics.
///
/// # Examples
/// ```
/// use pricer_core::types::{CalibrationError, SolverError};
///
/// let err: CalibrationError =
///     SolverError::NumericalInstability("singular update".to_string()).into();
/// assert!(err.is_solver_failure());
/// assert!(format!("{}", err).contains("singular update"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationError {
    /// The type of calibration error.
    pub kind: CalibrationErrorKind,

    /// Final residual sum of squares.
    pub residual_ss: f64,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Detailed error message.
    pub message: Option<String>,

    /// Final parameter values (if available).
    pub parameter_values: Option<Vec<f64>>,

    /// Underlying solver failure.
    pub cause: Option<SolverError>,
}

impl CalibrationError {
    /// Create a new calibration error.
    pub fn new(kind: CalibrationErrorKind) -> Self {
        Self {
            kind,
            residual_ss: f64::NAN,
            iterations: 0,
            message: None,
            parameter_values: None,
            cause: None,
        }
    }

    /// Wrap a solver failure.
    pub fn solver_failure(cause: SolverError) -> Self {
        Self {
            message: Some(cause.to_string()),
            cause: Some(cause),
            ..Self::new(CalibrationErrorKind::SolverFailure)
        }
    }

    /// Create a not-converged error.
    pub fn not_converged(iterations: usize, residual_ss: f64) -> Self {
        Self {
            residual_ss,
            iterations,
            message: Some(format!(
                "Failed to converge after {} iterations (residual_ss: {:.6e})",
                iterations, residual_ss
            )),
            ..Self::new(CalibrationErrorKind::NotConverged)
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self {
            message: Some(msg.clone()),
            ..Self::new(CalibrationErrorKind::InvalidConfiguration(msg))
        }
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(got: usize, need: usize) -> Self {
        Self {
            message: Some(format!(
                "Insufficient data: got {} points, need at least {}",
                got, need
            )),
            ..Self::new(CalibrationErrorKind::InsufficientData { got, need })
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self {
            message: Some(msg.clone()),
            ..Self::new(CalibrationErrorKind::InvalidParameter(msg))
        }
    }

    /// Create a simulation failure error.
    pub fn simulation_failure(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self {
            message: Some(msg.clone()),
            ..Self::new(CalibrationErrorKind::SimulationFailure(msg))
        }
    }

    /// Set the final parameter values.
    pub fn with_parameters(mut self, params: Vec<f64>) -> Self {
        self.parameter_values = Some(params);
        self
    }

    /// Set the residual sum of squares.
    pub fn with_residual(mut self, residual_ss: f64) -> Self {
        self.residual_ss = residual_ss;
        self
    }

    /// Set the iteration count.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set a detailed message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Check if the error wraps a solver failure.
    pub fn is_solver_failure(&self) -> bool {
        matches!(self.kind, CalibrationErrorKind::SolverFailure)
    }

    /// Check if the error is due to non-convergence.
    pub fn is_not_converged(&self) -> bool {
        matches!(self.kind, CalibrationErrorKind::NotConverged)
    }

    /// Check if the error is due to an inconsistent setup.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self.kind,
            CalibrationErrorKind::InvalidConfiguration(_)
                | CalibrationErrorKind::InsufficientData { .. }
        )
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Calibration error: {}", self.kind)?;
        if let Some(ref msg) = self.message {
            if matches!(self.kind, CalibrationErrorKind::SolverFailure) {
                write!(f, " - {}", msg)?;
            }
        }
        if self.iterations > 0 {
            write!(f, " (after {} iterations)", self.iterations)?;
        }
        if !self.residual_ss.is_nan() {
            write!(f, " [residual_ss: {:.6e}]", self.residual_ss)?;
        }
        Ok(())
    }
}

impl std::error::Error for CalibrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<SolverError> for CalibrationError {
    fn from(err: SolverError) -> Self {
        CalibrationError::solver_failure(err)
    }
}

impl From<ModelError> for CalibrationError {
    fn from(err: ModelError) -> Self {
        CalibrationError::invalid_parameter(err.to_string())
    }
}
