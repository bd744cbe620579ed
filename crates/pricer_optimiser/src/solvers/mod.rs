//! Optimizer capability used by the calibration engine.
//!
//! The engine hands an [`OptimizationProblem`] to an [`OptimizerFactory`]
//! and drives the resulting [`Optimizer`] through `run()`. Whatever happens
//! inside `run()` (worker threads, damping strategy, stopping rule) is the
//! optimizer's business.
//!
//! [`LevenbergMarquardtFactory`] is the default factory.

mod levenberg_marquardt;

use std::fmt;

use pricer_core::types::SolverError;

pub use levenberg_marquardt::{
    LevenbergMarquardtFactory, LevenbergMarquardtOptimizer, DEFAULT_OPTIMIZER_THREADS,
};

/// Objective mapping a parameter vector to model values.
///
/// Must be callable from several threads at once.
pub type ObjectiveFunction<'a> = dyn Fn(&[f64]) -> Result<Vec<f64>, SolverError> + Sync + 'a;

/// A least-squares problem `min Σ (f(p)_i − target_i)²`.
pub struct OptimizationProblem<'a> {
    /// Model values for a parameter vector.
    pub objective: &'a ObjectiveFunction<'a>,
    /// Initial guess.
    pub initial_parameters: Vec<f64>,
    /// Lower bounds; empty means unbounded.
    pub lower_bounds: Vec<f64>,
    /// Upper bounds; empty means unbounded.
    pub upper_bounds: Vec<f64>,
    /// Finite-difference step per parameter.
    pub parameter_steps: Vec<f64>,
    /// Target values.
    pub targets: Vec<f64>,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Required root mean squared error.
    pub accuracy: f64,
}

impl<'a> OptimizationProblem<'a> {
    /// Unbounded problem with default step and stopping rule.
    pub fn new(
        objective: &'a ObjectiveFunction<'a>,
        initial_parameters: Vec<f64>,
        targets: Vec<f64>,
    ) -> Self {
        let n = initial_parameters.len();
        Self {
            objective,
            initial_parameters,
            lower_bounds: vec![f64::NEG_INFINITY; n],
            upper_bounds: vec![f64::INFINITY; n],
            parameter_steps: vec![1e-4; n],
            targets,
            max_iterations: 400,
            accuracy: 1e-7,
        }
    }

    /// Number of free parameters.
    pub fn num_parameters(&self) -> usize {
        self.initial_parameters.len()
    }
}

impl fmt::Debug for OptimizationProblem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationProblem")
            .field("initial_parameters", &self.initial_parameters)
            .field("lower_bounds", &self.lower_bounds)
            .field("upper_bounds", &self.upper_bounds)
            .field("parameter_steps", &self.parameter_steps)
            .field("targets", &self.targets)
            .field("max_iterations", &self.max_iterations)
            .field("accuracy", &self.accuracy)
            .finish_non_exhaustive()
    }
}

/// A configured optimizer run.
pub trait Optimizer {
    /// Run to completion.
    ///
    /// # Errors
    ///
    /// Any [`SolverError`] raised by the algorithm or the objective.
    fn run(&mut self) -> Result<(), SolverError>;

    /// Best parameters found so far (the initial guess before `run`).
    fn best_fit_parameters(&self) -> &[f64];

    /// Iterations performed.
    fn iterations(&self) -> usize;

    /// Root mean squared error at the best fit.
    fn root_mean_squared_error(&self) -> f64;

    /// Whether the stopping rule was met before the iteration cap.
    fn converged(&self) -> bool;
}

/// Creates optimizers for calibration problems.
pub trait OptimizerFactory: Send + Sync + fmt::Debug {
    /// Optimizer for `problem`.
    fn create<'a>(&self, problem: OptimizationProblem<'a>) -> Box<dyn Optimizer + 'a>;
}
