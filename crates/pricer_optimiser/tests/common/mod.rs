//! Test doubles shared by the calibration integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pricer_core::types::{CalibrationError, PricingError, RandomVariable, SolverError, TimeDiscretization};
use pricer_models::models::covariance::{CovarianceModel, ParametricCovarianceModel};
use pricer_models::simulation::{BrownianMotion, SharedInstrument, SimulationContext, SimulationScheme};
use pricer_optimiser::solvers::{OptimizationProblem, Optimizer, OptimizerFactory};
use rand::Rng;

pub const N_PERIODS: usize = 4;

/// Route test logs through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn grid() -> TimeDiscretization {
    TimeDiscretization::uniform(0.0, N_PERIODS, 0.5).unwrap()
}

/// Deterministic forward levels, one per tenor period.
pub fn forward_levels() -> Vec<RandomVariable> {
    (0..N_PERIODS)
        .map(|i| RandomVariable::constant(0.02 + 0.005 * i as f64))
        .collect()
}

/// Context whose simulation exposes the substituted model and a frozen state.
pub struct StubContext<M> {
    pub model: M,
    pub grid: TimeDiscretization,
    pub num_factors: usize,
    pub state: Arc<[RandomVariable]>,
    pub fail_simulation: bool,
}

impl<M> StubContext<M> {
    pub fn new(model: M, num_factors: usize) -> Self {
        Self {
            model,
            grid: grid(),
            num_factors,
            state: forward_levels().into(),
            fail_simulation: false,
        }
    }

    /// Context whose simulations can never be built.
    pub fn with_failing_simulation(mut self) -> Self {
        self.fail_simulation = true;
        self
    }
}

/// Simulation handed to stub instruments.
pub struct StubSimulation<M> {
    pub model: M,
    pub state: Arc<[RandomVariable]>,
}

impl<M: ParametricCovarianceModel + Send + Sync> SimulationContext<M> for StubContext<M> {
    type Simulation = StubSimulation<M>;

    fn clone_with_covariance_model(&self, covariance_model: M) -> Result<Self, CalibrationError> {
        Ok(Self {
            model: covariance_model,
            grid: self.grid.clone(),
            num_factors: self.num_factors,
            state: Arc::clone(&self.state),
            fail_simulation: self.fail_simulation,
        })
    }

    fn time_discretization(&self) -> &TimeDiscretization {
        &self.grid
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        &self.grid
    }

    fn num_factors(&self) -> usize {
        self.num_factors
    }

    fn build_simulation(
        &self,
        _scheme: SimulationScheme,
        _brownian_motion: &Arc<BrownianMotion>,
    ) -> Result<StubSimulation<M>, CalibrationError> {
        if self.fail_simulation {
            return Err(CalibrationError::simulation_failure("forward rates diverged"));
        }
        Ok(StubSimulation {
            model: self.model.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

/// First entry of the factor loading of `component` at time index 0.
pub fn loading_instrument<M>(component: usize) -> SharedInstrument<StubSimulation<M>>
where
    M: CovarianceModel + Send + Sync + 'static,
{
    loading_instrument_at(0, component)
}

/// First entry of the factor loading of `component` at `time_index`.
pub fn loading_instrument_at<M>(time_index: usize, component: usize) -> SharedInstrument<StubSimulation<M>>
where
    M: CovarianceModel + Send + Sync + 'static,
{
    Arc::new(
        move |_t: f64, sim: &StubSimulation<M>| -> Result<RandomVariable, PricingError> {
            sim.model
                .factor_loading(time_index, component, Some(&sim.state[..]))
                .and_then(|loading| loading.into_iter().next())
                .ok_or_else(|| PricingError::ModelFailure("factor loading unavailable".to_string()))
        },
    )
}

/// Instrument whose valuation always fails.
pub fn failing_instrument<M: Send + Sync + 'static>() -> SharedInstrument<StubSimulation<M>> {
    Arc::new(|_t: f64, _sim: &StubSimulation<M>| -> Result<RandomVariable, PricingError> {
        Err(PricingError::NumericalInstability("payoff diverged".to_string()))
    })
}

/// Instrument that panics while valuing.
pub fn panicking_instrument<M: Send + Sync + 'static>() -> SharedInstrument<StubSimulation<M>> {
    Arc::new(|_t: f64, _sim: &StubSimulation<M>| -> Result<RandomVariable, PricingError> {
        let cashflows: Vec<f64> = Vec::new();
        Ok(RandomVariable::constant(cashflows[3]))
    })
}

/// Instrument returning `value` after a random delay of up to `max_delay_ms`.
pub fn jittered_instrument<M: Send + Sync + 'static>(
    value: f64,
    max_delay_ms: u64,
) -> SharedInstrument<StubSimulation<M>> {
    Arc::new(
        move |_t: f64, _sim: &StubSimulation<M>| -> Result<RandomVariable, PricingError> {
            let delay = rand::thread_rng().gen_range(0..=max_delay_ms);
            thread::sleep(Duration::from_millis(delay));
            Ok(RandomVariable::constant(value))
        },
    )
}

/// Factory whose optimizers evaluate a fixed list of trials and record the
/// objective output for each.
#[derive(Debug, Clone)]
pub struct RecordingFactory {
    pub trials: Vec<Vec<f64>>,
    pub recorded: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl RecordingFactory {
    pub fn new(trials: Vec<Vec<f64>>) -> Self {
        Self {
            trials,
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn recorded(&self) -> Vec<Vec<f64>> {
        self.recorded.lock().unwrap().clone()
    }
}

struct RecordingOptimizer<'a> {
    problem: OptimizationProblem<'a>,
    trials: Vec<Vec<f64>>,
    recorded: Arc<Mutex<Vec<Vec<f64>>>>,
    best: Vec<f64>,
    iterations: usize,
}

impl Optimizer for RecordingOptimizer<'_> {
    fn run(&mut self) -> Result<(), SolverError> {
        for trial in &self.trials {
            let values = (self.problem.objective)(trial)?;
            self.recorded.lock().unwrap().push(values);
            self.best = trial.clone();
            self.iterations += 1;
        }
        Ok(())
    }

    fn best_fit_parameters(&self) -> &[f64] {
        &self.best
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn root_mean_squared_error(&self) -> f64 {
        f64::NAN
    }

    fn converged(&self) -> bool {
        true
    }
}

impl OptimizerFactory for RecordingFactory {
    fn create<'a>(&self, problem: OptimizationProblem<'a>) -> Box<dyn Optimizer + 'a> {
        Box::new(RecordingOptimizer {
            best: problem.initial_parameters.clone(),
            problem,
            trials: self.trials.clone(),
            recorded: Arc::clone(&self.recorded),
            iterations: 0,
        })
    }
}

/// Factory whose optimizers always fail.
#[derive(Debug, Clone, Copy)]
pub struct BrokenFactory;

struct BrokenOptimizer {
    initial: Vec<f64>,
}

impl Optimizer for BrokenOptimizer {
    fn run(&mut self) -> Result<(), SolverError> {
        Err(SolverError::NumericalInstability("singular update".to_string()))
    }

    fn best_fit_parameters(&self) -> &[f64] {
        &self.initial
    }

    fn iterations(&self) -> usize {
        0
    }

    fn root_mean_squared_error(&self) -> f64 {
        f64::NAN
    }

    fn converged(&self) -> bool {
        false
    }
}

impl OptimizerFactory for BrokenFactory {
    fn create<'a>(&self, problem: OptimizationProblem<'a>) -> Box<dyn Optimizer + 'a> {
        Box::new(BrokenOptimizer {
            initial: problem.initial_parameters,
        })
    }
}
