//! # pricer_core: Numerical Foundation for Term-Structure Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core serves as the bottom layer of the calibration stack, providing:
//! - Path-wise random variables (`types::RandomVariable`)
//! - Time and tenor grids (`types::TimeDiscretization`)
//! - Parameter vectors exchanged with the optimizer (`types::ParameterVector`)
//! - Error types: `SolverError`, `ModelError`, `CalibrationError` (`types::error`)
//! - Bounded Levenberg-Marquardt solver (`math::solvers`)
//! - Parameter bounds (`traits::calibration`)
//! - Forward curves (`market_data::curves`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - num-traits: Generic floating-point yield curves
//! - rayon: Parallel Jacobian evaluation
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//! use pricer_core::types::{ParameterVector, RandomVariable, TimeDiscretization};
//!
//! let grid = TimeDiscretization::uniform(0.0, 8, 0.25).unwrap();
//! assert_eq!(grid.num_time_steps(), 8);
//!
//! let x = RandomVariable::from_realizations(0.0, vec![0.9, 1.1]);
//! assert!((x.average() - 1.0).abs() < 1e-15);
//!
//! let params = ParameterVector::from_scalars(&[0.0]);
//! let solver = LevenbergMarquardtSolver::new(LMConfig::new(1e-10, 50));
//! let fit = solver
//!     .solve(|p: &[f64]| vec![p[0] - 0.03], params.to_scalars())
//!     .unwrap();
//! assert!((fit.params[0] - 0.03).abs() < 1e-8);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for error types and parameter bounds

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod traits;
pub mod types;
