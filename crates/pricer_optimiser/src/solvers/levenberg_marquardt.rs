//! Levenberg-Marquardt optimizer backed by the core solver.

use pricer_core::math::solvers::{LMConfig, LMResult, LevenbergMarquardtSolver};
use pricer_core::types::SolverError;

use super::{OptimizationProblem, Optimizer, OptimizerFactory};

/// Worker threads used for Jacobian evaluation by default.
pub const DEFAULT_OPTIMIZER_THREADS: usize = 2;

/// Factory for [`LevenbergMarquardtOptimizer`]s.
///
/// # Examples
///
/// ```
/// use pricer_core::types::SolverError;
/// use pricer_optimiser::solvers::{LevenbergMarquardtFactory, OptimizationProblem, OptimizerFactory};
///
/// let objective = |p: &[f64]| Ok::<_, SolverError>(vec![p[0] * 2.0, p[0] + p[1]]);
/// let problem = OptimizationProblem::new(&objective, vec![0.0, 0.0], vec![1.0, 1.5]);
///
/// let mut optimizer = LevenbergMarquardtFactory::default().create(problem);
/// optimizer.run().unwrap();
/// let best = optimizer.best_fit_parameters();
/// assert!((best[0] - 0.5).abs() < 1e-6);
/// assert!((best[1] - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevenbergMarquardtFactory {
    num_threads: usize,
}

impl LevenbergMarquardtFactory {
    /// Factory whose optimizers use `num_threads` Jacobian workers.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Jacobian worker count.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl Default for LevenbergMarquardtFactory {
    fn default() -> Self {
        Self::new(DEFAULT_OPTIMIZER_THREADS)
    }
}

impl OptimizerFactory for LevenbergMarquardtFactory {
    fn create<'a>(&self, problem: OptimizationProblem<'a>) -> Box<dyn Optimizer + 'a> {
        Box::new(LevenbergMarquardtOptimizer::new(problem, self.num_threads))
    }
}

/// One Levenberg-Marquardt run over an [`OptimizationProblem`].
#[derive(Debug)]
pub struct LevenbergMarquardtOptimizer<'a> {
    problem: OptimizationProblem<'a>,
    num_threads: usize,
    result: Option<LMResult>,
}

impl<'a> LevenbergMarquardtOptimizer<'a> {
    /// Optimizer for `problem`.
    pub fn new(problem: OptimizationProblem<'a>, num_threads: usize) -> Self {
        Self {
            problem,
            num_threads,
            result: None,
        }
    }

    /// Raw solver result, once `run` has succeeded.
    pub fn result(&self) -> Option<&LMResult> {
        self.result.as_ref()
    }
}

impl Optimizer for LevenbergMarquardtOptimizer<'_> {
    fn run(&mut self) -> Result<(), SolverError> {
        let problem = &self.problem;
        let config = LMConfig::new(problem.accuracy, problem.max_iterations).with_threads(self.num_threads);
        let solver = LevenbergMarquardtSolver::new(config)
            .with_bounds(problem.lower_bounds.clone(), problem.upper_bounds.clone())
            .with_steps(problem.parameter_steps.clone());
        let objective = problem.objective;
        let result = solver.solve_with_targets(
            |p: &[f64]| objective(p),
            problem.initial_parameters.clone(),
            &problem.targets,
        )?;
        self.result = Some(result);
        Ok(())
    }

    fn best_fit_parameters(&self) -> &[f64] {
        match &self.result {
            Some(result) => &result.params,
            None => &self.problem.initial_parameters,
        }
    }

    fn iterations(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.iterations)
    }

    fn root_mean_squared_error(&self) -> f64 {
        self.result.as_ref().map_or(f64::NAN, LMResult::rmse)
    }

    fn converged(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.converged)
    }
}
