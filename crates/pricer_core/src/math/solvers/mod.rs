//! Optimization solvers for model calibration.
//!
//! ## Available Solvers
//!
//! - [`LevenbergMarquardtSolver`]: Bounded nonlinear least-squares with a
//!   finite-difference Jacobian evaluated on a rayon pool
//!
//! ## Bounds
//!
//! Parameter bounds are enforced through smooth reparameterisation
//! ([`ParameterTransform`]) rather than clamping, so the solver always works
//! on an unconstrained vector.
//!
//! ## Example
//!
//! ```
//! use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//!
//! // Minimize (p[0] - 2)² + (p[1] - 3)²
//! let residuals = |params: &[f64]| -> Vec<f64> {
//!     vec![params[0] - 2.0, params[1] - 3.0]
//! };
//!
//! let solver = LevenbergMarquardtSolver::new(LMConfig::default().with_threads(2));
//! let result = solver.solve(residuals, vec![0.0, 0.0]).unwrap();
//!
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! ```

mod bounds;
mod levenberg_marquardt;

pub use bounds::{logistic, safe_softplus, safe_softplus_inv, ParameterTransform, BOUNDARY_MARGIN};
pub use levenberg_marquardt::{LMConfig, LMResult, LevenbergMarquardtSolver};
