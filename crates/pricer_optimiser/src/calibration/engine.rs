//! Calibration engine for parametric covariance models.

use std::sync::Arc;
use std::time::Instant;

use pricer_core::traits::split_bounds;
use pricer_core::types::{CalibrationError, ParameterVector, SolverError};
use pricer_models::models::covariance::ParametricCovarianceModel;
use pricer_models::simulation::{BrownianMotion, SharedInstrument, SimulationContext};

use super::executor::TaskExecutor;
use super::objective::CalibrationObjective;
use super::options::CalibrationOptions;
use super::result::{CalibrationDiagnostics, CalibrationResult};
use super::weighting::ResidualWeights;
use crate::solvers::{LevenbergMarquardtFactory, OptimizationProblem, OptimizerFactory};

/// Fits the free parameters of a covariance model to instrument targets.
///
/// Each trial parameter vector is turned into a candidate model, the
/// simulation context is cloned around it, a fresh path simulation is built
/// on one shared Brownian driver and every instrument is valued at time 0.
/// The resulting values go to the configured optimizer (Levenberg-Marquardt
/// by default) as a least-squares problem against the targets.
#[derive(Debug, Clone, Default)]
pub struct CovarianceModelCalibrator {
    options: CalibrationOptions,
}

impl CovarianceModelCalibrator {
    /// Calibrator running with `options`.
    pub fn new(options: CalibrationOptions) -> Self {
        Self { options }
    }

    /// Options of this calibrator.
    pub fn options(&self) -> &CalibrationOptions {
        &self.options
    }

    /// Calibrate `model` to `targets`.
    ///
    /// `weights` is either empty (unit weights) or holds one non-negative
    /// weight per instrument. A model without free parameters is returned
    /// unchanged and the optimizer is not run. A run that stops at the
    /// iteration cap returns the best fit found with `converged == false`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for invalid options, mismatched instrument,
    ///   target, weight or bound counts, or a driver with too few factors
    /// - `InsufficientData` when there are no instruments
    /// - `SolverFailure` wrapping any error raised by the optimizer
    /// - errors from building the final model
    pub fn calibrate<M, C>(
        &self,
        model: &M,
        context: &C,
        instruments: &[SharedInstrument<C::Simulation>],
        targets: &[f64],
        weights: &[f64],
    ) -> Result<CalibrationResult<M>, CalibrationError>
    where
        M: ParametricCovarianceModel + Send + Sync,
        C: SimulationContext<M>,
    {
        let start = Instant::now();
        let options = &self.options;
        options.validate()?;

        if instruments.len() != targets.len() {
            return Err(CalibrationError::invalid_configuration(format!(
                "{} calibration instruments but {} targets",
                instruments.len(),
                targets.len()
            )));
        }
        if instruments.is_empty() {
            return Err(CalibrationError::insufficient_data(0, 1));
        }
        let weights = ResidualWeights::new(weights, instruments.len())?;

        let initial = model.parameters().to_scalars();
        if initial.is_empty() {
            tracing::info!(
                model = model.model_name(),
                "model has no free parameters, skipping calibration"
            );
            return Ok(CalibrationResult::success(
                model.clone(),
                initial,
                CalibrationDiagnostics::new(0, 0.0, start.elapsed()),
            ));
        }
        let n = initial.len();

        let (lower_bounds, upper_bounds) = match &options.parameter_bounds {
            Some(bounds) if bounds.len() != n => {
                return Err(CalibrationError::invalid_configuration(format!(
                    "{} parameter bounds for {} parameters",
                    bounds.len(),
                    n
                )));
            }
            Some(bounds) => split_bounds(bounds),
            None => (vec![f64::NEG_INFINITY; n], vec![f64::INFINITY; n]),
        };

        let brownian_motion = match &options.brownian_motion {
            Some(bm) => {
                if bm.num_factors() < context.num_factors() {
                    return Err(CalibrationError::invalid_configuration(format!(
                        "Brownian motion has {} factors, the model needs {}",
                        bm.num_factors(),
                        context.num_factors()
                    )));
                }
                Arc::clone(bm)
            }
            None => Arc::new(BrownianMotion::new(
                context.time_discretization().clone(),
                context.num_factors(),
                options.number_of_paths,
                options.seed,
            )?),
        };

        let executor = if options.parallel_valuation {
            TaskExecutor::worker_pool(options.number_of_threads)
        } else {
            TaskExecutor::Inline
        };

        tracing::info!(
            model = model.model_name(),
            parameters = n,
            instruments = instruments.len(),
            paths = brownian_motion.num_paths(),
            inline = executor.is_inline(),
            "starting covariance model calibration"
        );

        let objective = CalibrationObjective::new(
            model,
            context,
            instruments,
            targets,
            brownian_motion,
            options.scheme,
            &executor,
        )?;
        let objective_fn = |trial: &[f64]| -> Result<Vec<f64>, SolverError> {
            objective
                .values(trial)
                .map(|values| weights.apply(values))
                .map_err(|e| SolverError::ObjectiveFailure(e.to_string()))
        };

        let problem = OptimizationProblem {
            objective: &objective_fn,
            initial_parameters: initial,
            lower_bounds,
            upper_bounds,
            parameter_steps: vec![options.parameter_step; n],
            targets: weights.apply(targets.to_vec()),
            max_iterations: options.max_iterations,
            accuracy: options.accuracy,
        };

        let factory: Arc<dyn OptimizerFactory> = match &options.optimizer_factory {
            Some(factory) => Arc::clone(factory),
            None => Arc::new(LevenbergMarquardtFactory::default()),
        };
        let mut optimizer = factory.create(problem);
        optimizer.run().map_err(CalibrationError::solver_failure)?;

        let best_fit = optimizer.best_fit_parameters().to_vec();
        let iterations = optimizer.iterations();
        let rmse = optimizer.root_mean_squared_error();
        let converged = optimizer.converged();

        let calibrated = model.with_parameters(&ParameterVector::from_scalars(&best_fit))?;
        let instrument_errors: Vec<f64> = match objective.values(&best_fit) {
            Ok(values) => values
                .iter()
                .zip(targets)
                .map(|(value, target)| value - target)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not revalue instruments at the best fit");
                Vec::new()
            }
        };

        let diagnostics = CalibrationDiagnostics::new(iterations, rmse, start.elapsed())
            .with_evaluations(objective.evaluations())
            .with_instrument_errors(instrument_errors);

        if converged {
            tracing::info!(
                iterations,
                rmse,
                evaluations = diagnostics.evaluations,
                parameters = ?best_fit,
                "covariance model calibration converged"
            );
            Ok(CalibrationResult::success(calibrated, best_fit, diagnostics))
        } else {
            tracing::warn!(
                iterations,
                rmse,
                accuracy = options.accuracy,
                parameters = ?best_fit,
                "covariance model calibration stopped without reaching the required accuracy"
            );
            Ok(CalibrationResult::failure(calibrated, best_fit, diagnostics))
        }
    }
}

/// Calibration as a method on the model itself.
///
/// # Examples
///
/// ```no_run
/// # use pricer_models::models::covariance::ParametricCovarianceModel;
/// # use pricer_models::simulation::{SharedInstrument, SimulationContext};
/// # use pricer_core::types::CalibrationError;
/// use pricer_optimiser::calibration::{CalibrateCovarianceModel, CalibrationOptions};
///
/// # fn run<M, C>(model: M, context: C, instruments: Vec<SharedInstrument<C::Simulation>>, targets: Vec<f64>)
/// #     -> Result<M, CalibrationError>
/// # where M: ParametricCovarianceModel + Send + Sync, C: SimulationContext<M> {
/// let options = CalibrationOptions::default().with_number_of_paths(5000);
/// let calibrated = model.calibrated_clone(&context, &instruments, &targets, &[], &options)?;
/// # Ok(calibrated)
/// # }
/// ```
pub trait CalibrateCovarianceModel: ParametricCovarianceModel + Send + Sync {
    /// Calibrated copy of this model.
    ///
    /// # Errors
    ///
    /// As [`CovarianceModelCalibrator::calibrate`].
    fn calibrated_clone<C>(
        &self,
        context: &C,
        instruments: &[SharedInstrument<C::Simulation>],
        targets: &[f64],
        weights: &[f64],
        options: &CalibrationOptions,
    ) -> Result<Self, CalibrationError>
    where
        C: SimulationContext<Self>,
    {
        CovarianceModelCalibrator::new(options.clone())
            .calibrate(self, context, instruments, targets, weights)
            .map(CalibrationResult::into_model)
    }
}

impl<M: ParametricCovarianceModel + Send + Sync> CalibrateCovarianceModel for M {}
