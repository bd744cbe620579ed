//! Objective-function adapter.
//!
//! Turns a trial parameter vector into model-implied instrument values:
//!
//! 1. `model.with_parameters(trial)` gives a candidate covariance model
//! 2. the context is cloned around the candidate
//! 3. a fresh simulation is built on the shared Brownian driver
//! 4. every instrument is valued at time 0 through the [`TaskExecutor`]
//!
//! Per-instrument outcomes are kept as `Result`s by
//! [`CalibrationObjective::evaluate`]; [`substitute_failures`] then replaces
//! each failed valuation by its target, so a broken instrument contributes a
//! zero residual instead of aborting the optimizer. A panic inside an
//! instrument counts as a failed valuation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pricer_core::types::{CalibrationError, ParameterVector, PricingError, RandomVariable};
use pricer_models::models::covariance::ParametricCovarianceModel;
use pricer_models::simulation::{BrownianMotion, SharedInstrument, SimulationContext, SimulationScheme};

use super::executor::TaskExecutor;

/// Valuation outcome of one instrument.
pub type InstrumentOutcome = Result<RandomVariable, PricingError>;

/// Evaluation time passed to instruments.
pub const EVALUATION_TIME: f64 = 0.0;

/// Value one instrument, turning a panic into [`PricingError::ModelFailure`].
fn value_guarded<S>(instrument: &SharedInstrument<S>, simulation: &S) -> InstrumentOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| instrument.value(EVALUATION_TIME, simulation)))
        .unwrap_or_else(|payload| {
            Err(PricingError::ModelFailure(format!(
                "instrument valuation panicked: {}",
                panic_message(payload.as_ref())
            )))
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Replace failed valuations by their targets and reduce values to their
/// path average.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{PricingError, RandomVariable};
/// use pricer_optimiser::calibration::substitute_failures;
///
/// let outcomes = vec![
///     Ok(RandomVariable::constant(0.5)),
///     Err(PricingError::ModelFailure("no convergence".to_string())),
///     Ok(RandomVariable::from_realizations(0.0, vec![1.0, 3.0])),
/// ];
/// assert_eq!(substitute_failures(outcomes, &[0.4, 0.7, 2.5]), vec![0.5, 0.7, 2.0]);
/// ```
pub fn substitute_failures(outcomes: Vec<InstrumentOutcome>, targets: &[f64]) -> Vec<f64> {
    outcomes
        .into_iter()
        .zip(targets)
        .enumerate()
        .map(|(i, (outcome, &target))| match outcome {
            Ok(value) => value.average(),
            Err(e) => {
                tracing::debug!(instrument = i, error = %e, target_value = target, "valuation failed, using target");
                target
            }
        })
        .collect()
}

/// Objective adapter over a covariance model and its simulation context.
///
/// Reentrant: several trial vectors may be evaluated concurrently.
pub struct CalibrationObjective<'a, M, C>
where
    C: SimulationContext<M>,
{
    model: &'a M,
    context: &'a C,
    instruments: &'a [SharedInstrument<C::Simulation>],
    targets: &'a [f64],
    brownian_motion: Arc<BrownianMotion>,
    scheme: SimulationScheme,
    executor: &'a TaskExecutor,
    evaluations: AtomicUsize,
}

impl<'a, M, C> CalibrationObjective<'a, M, C>
where
    M: ParametricCovarianceModel,
    C: SimulationContext<M>,
{
    /// Create the adapter.
    ///
    /// # Errors
    ///
    /// [`CalibrationError`] with kind `InvalidConfiguration` if instrument
    /// and target counts differ.
    pub fn new(
        model: &'a M,
        context: &'a C,
        instruments: &'a [SharedInstrument<C::Simulation>],
        targets: &'a [f64],
        brownian_motion: Arc<BrownianMotion>,
        scheme: SimulationScheme,
        executor: &'a TaskExecutor,
    ) -> Result<Self, CalibrationError> {
        if instruments.len() != targets.len() {
            return Err(CalibrationError::invalid_configuration(format!(
                "{} calibration instruments but {} targets",
                instruments.len(),
                targets.len()
            )));
        }
        Ok(Self {
            model,
            context,
            instruments,
            targets,
            brownian_motion,
            scheme,
            executor,
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Raw per-instrument outcomes for a trial vector, in instrument order.
    ///
    /// # Errors
    ///
    /// Failures to build the candidate model, the context clone or the
    /// simulation. Instrument failures are returned as outcomes, not errors.
    pub fn evaluate(&self, trial: &[f64]) -> Result<Vec<InstrumentOutcome>, CalibrationError> {
        let evaluation = self.evaluations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(evaluation, parameters = ?trial, "evaluating calibration objective");

        let candidate = self
            .model
            .with_parameters(&ParameterVector::from_scalars(trial))?;
        let context = self.context.clone_with_covariance_model(candidate)?;
        let simulation = context.build_simulation(self.scheme, &self.brownian_motion)?;

        Ok(self
            .executor
            .map_ordered(self.instruments, |instrument| {
                value_guarded(instrument, &simulation)
            }))
    }

    /// Model values for a trial vector, failed valuations replaced by their
    /// targets.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate).
    pub fn values(&self, trial: &[f64]) -> Result<Vec<f64>, CalibrationError> {
        let outcomes = self.evaluate(trial)?;
        let failures = outcomes.iter().filter(|o| o.is_err()).count();
        if failures > 0 {
            tracing::trace!(failures, "substituting failed valuations");
        }
        Ok(substitute_failures(outcomes, self.targets))
    }

    /// Targets, in instrument order.
    pub fn targets(&self) -> &[f64] {
        self.targets
    }

    /// Number of instruments.
    pub fn num_instruments(&self) -> usize {
        self.instruments.len()
    }

    /// Evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}
