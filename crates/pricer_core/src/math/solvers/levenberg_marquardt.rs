//! Levenberg-Marquardt nonlinear least-squares solver.
//!
//! This module provides the [`LevenbergMarquardtSolver`] for fitting model
//! parameters to target values, as needed by covariance model calibration.
//!
//! # Algorithm
//!
//! The Levenberg-Marquardt algorithm combines Gauss-Newton and gradient descent:
//!
//! ```text
//! (J^T J + λI) δ = -J^T r
//! y_{n+1} = y_n + δ
//! ```
//!
//! where:
//! - `J` is the finite-difference Jacobian of the residuals `r = f(x) - target`
//! - `λ` is the damping factor (adjusted during iteration)
//! - `y` is the unconstrained internal vector, mapped to the bounded
//!   parameters by [`ParameterTransform`]
//!
//! Jacobian columns are independent objective evaluations and are computed
//! concurrently on a dedicated rayon pool of [`LMConfig::num_threads`]
//! workers.
//!
//! # Convergence
//!
//! The solver stops when the root mean squared error falls below
//! `tolerance`, when an accepted step improves it by less than `tolerance`,
//! when the parameter change is negligible, or after `max_iterations`. In the
//! last case the result is returned with `converged == false`.
//!
//! # Example
//!
//! ```
//! use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//!
//! // Fit y = a * exp(-b * x) to data
//! let x_data = vec![0.0, 1.0, 2.0, 3.0, 4.0];
//! let y_data: Vec<f64> = x_data.iter().map(|&x: &f64| 2.0 * (-0.5 * x).exp()).collect();
//!
//! let solver = LevenbergMarquardtSolver::new(LMConfig::default())
//!     .with_bounds(vec![0.0, 0.0], vec![f64::INFINITY, 5.0]);
//!
//! let model = |params: &[f64]| {
//!     Ok(x_data.iter().map(|&x| params[0] * (-params[1] * x).exp()).collect())
//! };
//!
//! let result = solver.solve_with_targets(model, vec![1.0, 1.0], &y_data).unwrap();
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-4);
//! assert!((result.params[1] - 0.5).abs() < 1e-4);
//! ```

use rayon::prelude::*;
use rayon::ThreadPool;

use super::bounds::ParameterTransform;
use crate::types::SolverError;

/// Configuration for Levenberg-Marquardt solver.
///
/// # Fields
///
/// * `tolerance` - Convergence tolerance on the RMS error and its improvement
/// * `max_iterations` - Maximum number of iterations
/// * `initial_lambda` - Initial damping factor
/// * `lambda_up` - Factor to increase lambda when step is rejected
/// * `lambda_down` - Factor to decrease lambda when step is accepted
/// * `min_lambda` - Minimum value for lambda
/// * `max_lambda` - Maximum value for lambda
/// * `num_threads` - Workers used for Jacobian evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LMConfig {
    /// Convergence tolerance on the root mean squared error.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Factor to increase lambda on rejected step.
    pub lambda_up: f64,
    /// Factor to decrease lambda on accepted step.
    pub lambda_down: f64,
    /// Minimum damping factor.
    pub min_lambda: f64,
    /// Maximum damping factor.
    pub max_lambda: f64,
    /// Tolerance for parameter change convergence.
    pub param_tolerance: f64,
    /// Number of worker threads for Jacobian columns (1 = sequential).
    pub num_threads: usize,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            param_tolerance: 1e-12,
            num_threads: 1,
        }
    }
}

impl LMConfig {
    /// Create a new LM configuration.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Set the number of Jacobian worker threads.
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }
}

/// Result of Levenberg-Marquardt optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Final optimized parameters.
    pub params: Vec<f64>,
    /// Final residual sum of squares.
    pub residual_ss: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
    /// Final lambda value.
    pub final_lambda: f64,
    /// Number of residuals.
    pub n_residuals: usize,
}

impl LMResult {
    /// Root mean squared error at the final parameters.
    pub fn rmse(&self) -> f64 {
        if self.n_residuals == 0 {
            return 0.0;
        }
        (self.residual_ss / self.n_residuals as f64).sqrt()
    }
}

/// Levenberg-Marquardt nonlinear least-squares solver.
///
/// Solves optimization problems of the form:
/// ```text
/// min_x ||f(x) - target||^2   subject to  lower <= x <= upper
/// ```
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
///
/// // Simple quadratic: minimize (p[0] - 2)^2 + (p[1] - 3)^2
/// let residuals = |params: &[f64]| -> Vec<f64> {
///     vec![params[0] - 2.0, params[1] - 3.0]
/// };
///
/// let solver = LevenbergMarquardtSolver::with_defaults();
/// let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();
/// assert!(result.converged);
/// assert!((result.params[0] - 2.0).abs() < 1e-6);
/// assert!((result.params[1] - 3.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
    lower: Vec<f64>,
    upper: Vec<f64>,
    steps: Vec<f64>,
}

impl LevenbergMarquardtSolver {
    /// Create a new LM solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Set componentwise parameter bounds (infinite entries are absent).
    pub fn with_bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Set the finite-difference step per parameter.
    pub fn with_steps(mut self, steps: Vec<f64>) -> Self {
        self.steps = steps;
        self
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Solve an unconstrained residual problem `min ||r(p)||²`.
    ///
    /// Bounds and steps configured on the solver still apply.
    pub fn solve<F>(&self, residuals: F, initial_params: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64> + Sync,
    {
        self.minimise(|p| Ok(residuals(p)), initial_params)
    }

    /// Fit model values to targets, `min Σ (f(p)_i - target_i)²`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::InvalidInput`] for empty parameters or targets,
    ///   inconsistent bound/step lengths, or a value vector whose length
    ///   differs from `targets`
    /// - [`SolverError::ObjectiveFailure`] (or any error) raised by `values`
    /// - [`SolverError::NumericalInstability`] if the initial values are not
    ///   finite or the damped normal equations stay singular
    pub fn solve_with_targets<F>(
        &self,
        values: F,
        initial_params: Vec<f64>,
        targets: &[f64],
    ) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Result<Vec<f64>, SolverError> + Sync,
    {
        if targets.is_empty() {
            return Err(SolverError::InvalidInput("Empty target vector".to_string()));
        }
        self.minimise(
            |p| {
                let v = values(p)?;
                if v.len() != targets.len() {
                    return Err(SolverError::InvalidInput(format!(
                        "objective returned {} values for {} targets",
                        v.len(),
                        targets.len()
                    )));
                }
                Ok(v.iter().zip(targets).map(|(v, t)| v - t).collect())
            },
            initial_params,
        )
    }

    fn transforms(&self, n_params: usize) -> Result<Vec<ParameterTransform>, SolverError> {
        let lower = expand(&self.lower, n_params, f64::NEG_INFINITY, "lower bound")?;
        let upper = expand(&self.upper, n_params, f64::INFINITY, "upper bound")?;
        lower
            .iter()
            .zip(&upper)
            .map(|(&l, &u)| ParameterTransform::from_bounds(l, u))
            .collect()
    }

    fn minimise<F>(&self, residuals: F, initial_params: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Result<Vec<f64>, SolverError> + Sync,
    {
        let n_params = initial_params.len();
        if n_params == 0 {
            return Err(SolverError::InvalidInput(
                "Empty parameter vector".to_string(),
            ));
        }
        let transforms = self.transforms(n_params)?;
        let steps = if self.steps.is_empty() {
            initial_params.iter().map(|p| 1e-8 * p.abs().max(1.0)).collect()
        } else {
            expand(&self.steps, n_params, 0.0, "step")?
        };
        if let Some(s) = steps.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(SolverError::InvalidInput(format!(
                "finite-difference step must be positive, got {}",
                s
            )));
        }

        let pool = self.build_pool();
        let to_external = |y: &[f64]| -> Vec<f64> {
            y.iter().zip(&transforms).map(|(&y, t)| t.to_external(y)).collect()
        };

        let mut internal: Vec<f64> = initial_params
            .iter()
            .zip(&transforms)
            .map(|(&x, t)| t.to_internal(x))
            .collect();
        let mut params = to_external(&internal);
        let mut r = residuals(&params)?;
        let n_residuals = r.len();
        if n_residuals == 0 {
            return Err(SolverError::InvalidInput(
                "Empty residual vector".to_string(),
            ));
        }
        if r.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NumericalInstability(
                "non-finite objective value at initial parameters".to_string(),
            ));
        }

        let mut ss = sum_of_squares(&r);
        let mut lambda = self.config.initial_lambda;
        let rms = |ss: f64| (ss / n_residuals as f64).sqrt();
        let result = |params: Vec<f64>, ss: f64, iterations: usize, converged: bool, lambda: f64| {
            LMResult {
                params,
                residual_ss: ss,
                iterations,
                converged,
                final_lambda: lambda,
                n_residuals,
            }
        };

        let mut iteration = 0;
        while iteration < self.config.max_iterations {
            if rms(ss) <= self.config.tolerance {
                return Ok(result(params, ss, iteration, true, lambda));
            }
            iteration += 1;

            let jacobian = compute_jacobian(
                &residuals,
                pool.as_ref(),
                &internal,
                &params,
                &transforms,
                &steps,
                &r,
            )?;

            let delta = loop {
                match solve_normal_equations(&jacobian, &r, lambda) {
                    Some(d) => break d,
                    None if lambda < self.config.max_lambda => {
                        lambda = (lambda * self.config.lambda_up).min(self.config.max_lambda);
                    }
                    None => {
                        return Err(SolverError::NumericalInstability(
                            "damped normal equations are singular".to_string(),
                        ))
                    }
                }
            };

            let step_norm = delta.iter().map(|d| d * d).sum::<f64>().sqrt();
            let internal_norm = internal.iter().map(|y| y * y).sum::<f64>().sqrt().max(1.0);
            if step_norm / internal_norm < self.config.param_tolerance {
                return Ok(result(params, ss, iteration, true, lambda));
            }

            let trial_internal: Vec<f64> =
                internal.iter().zip(&delta).map(|(y, d)| y + d).collect();
            let trial_params = to_external(&trial_internal);
            let trial_r = residuals(&trial_params)?;
            let trial_ss = sum_of_squares(&trial_r);

            if trial_ss.is_finite() && trial_ss < ss {
                let improvement = rms(ss) - rms(trial_ss);
                internal = trial_internal;
                params = trial_params;
                r = trial_r;
                ss = trial_ss;
                lambda = (lambda * self.config.lambda_down).max(self.config.min_lambda);
                if rms(ss) <= self.config.tolerance || improvement < self.config.tolerance {
                    return Ok(result(params, ss, iteration, true, lambda));
                }
            } else if lambda >= self.config.max_lambda {
                // No descent direction left at maximal damping.
                break;
            } else {
                lambda = (lambda * self.config.lambda_up).min(self.config.max_lambda);
            }
        }

        let converged = rms(ss) <= self.config.tolerance;
        Ok(result(params, ss, iteration, converged, lambda))
    }

    fn build_pool(&self) -> Option<ThreadPool> {
        if self.config.num_threads <= 1 {
            return None;
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .thread_name(|i| format!("lm-jacobian-{}", i))
            .build()
            .ok()
    }
}

/// Broadcast an empty vector to `n` copies of `default`, otherwise require length `n`.
fn expand(values: &[f64], n: usize, default: f64, what: &str) -> Result<Vec<f64>, SolverError> {
    match values.len() {
        0 => Ok(vec![default; n]),
        len if len == n => Ok(values.to_vec()),
        len => Err(SolverError::InvalidInput(format!(
            "{} vector has length {}, expected {}",
            what, len, n
        ))),
    }
}

/// Compute Jacobian columns with respect to the internal coordinates.
///
/// Each column is a forward difference in the external parameter, stepping
/// downwards when the upward step would cross an upper bound, scaled by the
/// transform derivative.
fn compute_jacobian<F>(
    residuals: &F,
    pool: Option<&ThreadPool>,
    internal: &[f64],
    params: &[f64],
    transforms: &[ParameterTransform],
    steps: &[f64],
    r0: &[f64],
) -> Result<Vec<Vec<f64>>, SolverError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, SolverError> + Sync,
{
    let column = |j: usize| -> Result<Vec<f64>, SolverError> {
        let mut h = steps[j];
        if transforms[j].upper().is_some_and(|u| params[j] + h > u) {
            h = -h;
        }
        let mut bumped = params.to_vec();
        bumped[j] += h;
        let r_bumped = residuals(&bumped)?;
        if r_bumped.len() != r0.len() {
            return Err(SolverError::InvalidInput(
                "objective changed its output length".to_string(),
            ));
        }
        let scale = transforms[j].derivative(internal[j]) / h;
        let col: Vec<f64> = r_bumped.iter().zip(r0).map(|(rb, r)| (rb - r) * scale).collect();
        if col.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NumericalInstability(format!(
                "non-finite Jacobian column {}",
                j
            )));
        }
        Ok(col)
    };

    match pool {
        Some(pool) => pool.install(|| (0..params.len()).into_par_iter().map(column).collect()),
        None => (0..params.len()).map(column).collect(),
    }
}

/// Compute sum of squares of a vector.
#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Solve `(J^T J + λI) δ = -J^T r` with `J` given by columns.
fn solve_normal_equations(columns: &[Vec<f64>], residuals: &[f64], lambda: f64) -> Option<Vec<f64>> {
    let n = columns.len();
    let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();

    let mut jtj = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let v = dot(&columns[i], &columns[j]);
            jtj[i][j] = v;
            jtj[j][i] = v;
        }
        jtj[i][i] += lambda;
    }
    let jtr: Vec<f64> = columns.iter().map(|c| -dot(c, residuals)).collect();

    solve_cholesky(&jtj, &jtr)
}

/// Solve Ax = b using Cholesky decomposition.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L^T
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum.is_nan() || sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        y[i] = (b[i] - (0..i).map(|j| l[i][j] * y[j]).sum::<f64>()) / l[i][i];
    }

    // L^T x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = (y[i] - ((i + 1)..n).map(|j| l[j][i] * x[j]).sum::<f64>()) / l[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ========================================
    // LMConfig Tests
    // ========================================

    #[test]
    fn test_config_default() {
        let config = LMConfig::default();
        assert_relative_eq!(config.tolerance, 1e-10);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.num_threads, 1);
        assert!(config.initial_lambda > 0.0);
    }

    #[test]
    fn test_config_with_threads_floors_at_one() {
        assert_eq!(LMConfig::default().with_threads(0).num_threads, 1);
        assert_eq!(LMConfig::default().with_threads(4).num_threads, 4);
    }

    #[test]
    fn test_result_rmse() {
        let result = LMResult {
            params: vec![1.0],
            residual_ss: 4.0,
            iterations: 10,
            converged: true,
            final_lambda: 1e-5,
            n_residuals: 4,
        };
        assert_relative_eq!(result.rmse(), 1.0);
    }

    // ========================================
    // Solver Tests
    // ========================================

    #[test]
    fn test_solve_simple_linear() {
        let residuals = |params: &[f64]| -> Vec<f64> { vec![params[0] - 2.0, params[1] - 3.0] };

        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.params[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_solve_rosenbrock() {
        let residuals = |params: &[f64]| -> Vec<f64> {
            vec![10.0 * (params[1] - params[0] * params[0]), 1.0 - params[0]]
        };

        let config = LMConfig {
            max_iterations: 200,
            ..Default::default()
        };
        let solver = LevenbergMarquardtSolver::new(config);
        let result = solver.solve(residuals, vec![-1.2, 1.0]).unwrap();

        assert!((result.params[0] - 1.0).abs() < 1e-3 || result.residual_ss < 1e-6);
    }

    #[test]
    fn test_solve_already_optimal() {
        let residuals = |params: &[f64]| -> Vec<f64> { vec![params[0] - 5.0] };

        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(residuals, vec![5.0]).unwrap();

        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_solve_empty_params() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(|_: &[f64]| vec![1.0], vec![]);
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn test_solve_with_targets_and_steps() {
        let targets = [1.0, 2.0, 3.0];
        let values = |p: &[f64]| Ok(vec![p[0], 2.0 * p[0], 3.0 * p[0]]);

        let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-7, 400)).with_steps(vec![1e-4]);
        let result = solver.solve_with_targets(values, vec![0.0], &targets).unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-6);
        assert!(result.rmse() < 1e-6);
    }

    #[test]
    fn test_lower_bound_is_respected() {
        // Unconstrained optimum at -1, constrained optimum on the bound at 0.
        let residuals = |p: &[f64]| vec![p[0] + 1.0];
        let solver = LevenbergMarquardtSolver::with_defaults()
            .with_bounds(vec![0.0], vec![f64::INFINITY]);
        let result = solver.solve(residuals, vec![2.0]).unwrap();

        assert!(result.params[0] >= 0.0);
        assert!(result.params[0] < 1e-3);
    }

    #[test]
    fn test_interval_bounds_fit_inside() {
        let residuals = |p: &[f64]| vec![p[0] - 0.3];
        let solver = LevenbergMarquardtSolver::with_defaults().with_bounds(vec![0.0], vec![1.0]);
        let result = solver.solve(residuals, vec![0.9]).unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.params[0], 0.3, epsilon = 1e-8);
    }

    #[test]
    fn test_bound_length_mismatch() {
        let solver = LevenbergMarquardtSolver::with_defaults()
            .with_bounds(vec![0.0, 0.0], vec![f64::INFINITY]);
        let result = solver.solve(|p: &[f64]| vec![p[0]], vec![1.0]);
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn test_target_length_mismatch() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve_with_targets(|p: &[f64]| Ok(vec![p[0]]), vec![1.0], &[1.0, 2.0]);
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn test_objective_failure_propagates() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve_with_targets(
            |_: &[f64]| Err(SolverError::ObjectiveFailure("boom".to_string())),
            vec![1.0],
            &[0.0],
        );
        assert_eq!(
            result.unwrap_err(),
            SolverError::ObjectiveFailure("boom".to_string())
        );
    }

    #[test]
    fn test_non_finite_initial_value() {
        let solver = LevenbergMarquardtSolver::with_defaults();
        let result = solver.solve(|_: &[f64]| vec![f64::NAN], vec![1.0]);
        assert!(matches!(result, Err(SolverError::NumericalInstability(_))));
    }

    #[test]
    fn test_iteration_cap_returns_best_fit() {
        let residuals = |p: &[f64]| vec![(p[0] - 3.0).powi(3), p[0] - 3.0];
        let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-14, 2));
        let result = solver.solve(residuals, vec![0.0]).unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
        assert!(result.residual_ss < 9.0 * 9.0 * 9.0 + 9.0);
    }

    #[test]
    fn test_parallel_jacobian_matches_sequential() {
        let residuals = |p: &[f64]| {
            vec![
                p[0] * p[1] - 2.0,
                p[0] + p[2] - 4.0,
                p[1] * p[1] + p[2] - 5.0,
                p[0] - 1.0,
            ]
        };
        let sequential = LevenbergMarquardtSolver::new(LMConfig::default())
            .solve(residuals, vec![0.5, 0.5, 0.5])
            .unwrap();
        let parallel = LevenbergMarquardtSolver::new(LMConfig::default().with_threads(3))
            .solve(residuals, vec![0.5, 0.5, 0.5])
            .unwrap();

        assert_eq!(sequential.params, parallel.params);
        assert_eq!(sequential.iterations, parallel.iterations);
    }

    #[test]
    fn test_jacobian_evaluates_each_column_once() {
        let calls = AtomicUsize::new(0);
        let residuals = |p: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![2.0 * p[0] + 3.0 * p[1]])
        };
        let transforms = [ParameterTransform::Identity; 2];
        let params = [1.0, 1.0];
        let r0 = [5.0];
        let jacobian = compute_jacobian(
            &residuals,
            None,
            &params,
            &params,
            &transforms,
            &[1e-6, 1e-6],
            &r0,
        )
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_relative_eq!(jacobian[0][0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(jacobian[1][0], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_jacobian_steps_down_at_upper_bound() {
        let residuals = |p: &[f64]| Ok(vec![p[0] * p[0]]);
        let transforms = [ParameterTransform::Upper(1.0)];
        let internal = [transforms[0].to_internal(1.0)];
        let params = [transforms[0].to_external(internal[0])];
        let r0 = [params[0] * params[0]];
        let jacobian =
            compute_jacobian(&residuals, None, &internal, &params, &transforms, &[1e-6], &r0)
                .unwrap();

        let expected = 2.0 * params[0] * transforms[0].derivative(internal[0]);
        assert_relative_eq!(jacobian[0][0], expected, epsilon = 1e-5);
    }

    // ========================================
    // Cholesky Solver Tests
    // ========================================

    #[test]
    fn test_cholesky_simple() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 2.0]];
        let b = vec![8.0, 5.0];

        let x = solve_cholesky(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.5, epsilon = 1e-10);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_cholesky_non_positive_definite() {
        let a = vec![vec![-1.0, 0.0], vec![0.0, 1.0]];
        assert!(solve_cholesky(&a, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_normal_equations_damping_regularises_zero_column() {
        let columns = vec![vec![1.0, 1.0], vec![0.0, 0.0]];
        let delta = solve_normal_equations(&columns, &[1.0, 1.0], 1e-3).unwrap();
        assert_relative_eq!(delta[0], -2.0 / 2.001, epsilon = 1e-12);
        assert_eq!(delta[1], 0.0);
    }
}
