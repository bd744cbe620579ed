//! Generic calibration of parametric covariance models.
//!
//! The engine works for any [`ParametricCovarianceModel`] together with a
//! [`SimulationContext`] able to rebuild the full model around a candidate
//! covariance model:
//!
//! 1. the model's current parameters are the initial guess
//! 2. [`CalibrationObjective`] maps trial parameters to instrument values,
//!    substituting the target for any instrument whose valuation fails
//! 3. [`ResidualWeights`] scales values and targets
//! 4. the optimizer from the configured [`OptimizerFactory`] runs the
//!    least-squares fit
//! 5. the best fit is substituted into the model
//!
//! Instrument valuation runs on a [`TaskExecutor`], either a rayon worker
//! pool or inline on the calling thread, with identical results.
//!
//! [`ParametricCovarianceModel`]: pricer_models::models::covariance::ParametricCovarianceModel
//! [`SimulationContext`]: pricer_models::simulation::SimulationContext
//! [`OptimizerFactory`]: crate::solvers::OptimizerFactory

mod engine;
mod executor;
mod objective;
mod options;
mod result;
mod weighting;

pub use engine::{CalibrateCovarianceModel, CovarianceModelCalibrator};
pub use executor::TaskExecutor;
pub use objective::{substitute_failures, CalibrationObjective, InstrumentOutcome, EVALUATION_TIME};
pub use options::{
    CalibrationOptions, OptionValue, DEFAULT_ACCURACY, DEFAULT_MAX_ITERATIONS,
    DEFAULT_NUMBER_OF_PATHS, DEFAULT_PARAMETER_STEP, DEFAULT_SEED,
};
pub use result::{CalibrationDiagnostics, CalibrationResult};
pub use weighting::ResidualWeights;
