//! Calibration result types.
//!
//! This module defines the calibrated model together with the best-fit
//! parameters and diagnostic information about the run.

use std::time::Duration;

/// Calibration diagnostics.
///
/// Contains detailed information about the calibration process
/// for analysis and debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationDiagnostics {
    /// Number of optimizer iterations performed
    pub iterations: usize,
    /// Objective evaluations (full re-simulations) performed
    pub evaluations: usize,
    /// Root mean squared (weighted) residual reported by the optimizer
    pub rmse: f64,
    /// Maximum absolute instrument error at the best fit
    pub max_error: f64,
    /// Calibration duration
    pub duration: Duration,
    /// Model value minus target per instrument at the best fit; empty if
    /// the instruments could not be revalued there
    pub instrument_errors: Vec<f64>,
}

impl Default for CalibrationDiagnostics {
    fn default() -> Self {
        Self {
            iterations: 0,
            evaluations: 0,
            rmse: 0.0,
            max_error: 0.0,
            duration: Duration::ZERO,
            instrument_errors: Vec::new(),
        }
    }
}

impl CalibrationDiagnostics {
    /// Create new diagnostics with basic information.
    pub fn new(iterations: usize, rmse: f64, duration: Duration) -> Self {
        Self {
            iterations,
            rmse,
            duration,
            ..Self::default()
        }
    }

    /// Set the evaluation count.
    pub fn with_evaluations(mut self, evaluations: usize) -> Self {
        self.evaluations = evaluations;
        self
    }

    /// Set individual instrument errors.
    pub fn with_instrument_errors(mut self, errors: Vec<f64>) -> Self {
        self.max_error = errors.iter().map(|e| e.abs()).fold(0.0_f64, f64::max);
        self.instrument_errors = errors;
        self
    }

    /// Check if calibration quality is acceptable.
    ///
    /// # Arguments
    ///
    /// * `tolerance` - Maximum acceptable absolute instrument error
    pub fn is_quality_acceptable(&self, tolerance: f64) -> bool {
        self.max_error <= tolerance
    }
}

/// Calibration result.
///
/// Carries the calibrated model, its best-fit parameter vector and
/// diagnostics. A result with `converged == false` still holds the best
/// parameters the optimizer found.
#[derive(Debug, Clone)]
pub struct CalibrationResult<M> {
    /// Calibrated model
    pub model: M,
    /// Best-fit parameters
    pub parameters: Vec<f64>,
    /// Whether the optimizer met its stopping rule
    pub converged: bool,
    /// Calibration diagnostics
    pub diagnostics: CalibrationDiagnostics,
}

impl<M> CalibrationResult<M> {
    /// Create a converged calibration result.
    pub fn success(model: M, parameters: Vec<f64>, diagnostics: CalibrationDiagnostics) -> Self {
        Self {
            model,
            parameters,
            converged: true,
            diagnostics,
        }
    }

    /// Create a result that stopped short of its stopping rule.
    pub fn failure(model: M, parameters: Vec<f64>, diagnostics: CalibrationDiagnostics) -> Self {
        Self {
            model,
            parameters,
            converged: false,
            diagnostics,
        }
    }

    /// Check if calibration converged.
    pub fn is_success(&self) -> bool {
        self.converged
    }

    /// Get the RMSE of the calibration.
    pub fn rmse(&self) -> f64 {
        self.diagnostics.rmse
    }

    /// Take the calibrated model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Map the model type to a different type.
    pub fn map<N, F>(self, f: F) -> CalibrationResult<N>
    where
        F: FnOnce(M) -> N,
    {
        CalibrationResult {
            model: f(self.model),
            parameters: self.parameters,
            converged: self.converged,
            diagnostics: self.diagnostics,
        }
    }
}
