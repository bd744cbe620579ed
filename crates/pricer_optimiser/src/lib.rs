//! # pricer_optimiser
//!
//! Optimizers and the generic calibration engine for covariance models.
//!
//! This crate sits on top of the covariance models (L2), solving the inverse
//! problem of finding model parameters that reproduce instrument targets.
//!
//! ## Architecture Position
//!
//! Layer 2.5 of the pricer stack.
//! Depends on `pricer_core` (L1) and `pricer_models` (L2).
//!
//! ## Modules
//!
//! - `calibration`: objective adapter, task executor, options and the
//!   calibration engine
//! - `solvers`: optimizer capability and the Levenberg-Marquardt factory
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pricer_core::types::{CalibrationError, PricingError, RandomVariable, TimeDiscretization};
//! use pricer_models::models::covariance::{
//!     ConstantCovarianceModel, CovarianceModel, DisplacedCovarianceModel,
//! };
//! use pricer_models::simulation::{
//!     BrownianMotion, SharedInstrument, SimulationContext, SimulationScheme,
//! };
//! use pricer_optimiser::prelude::*;
//!
//! type Model = DisplacedCovarianceModel<ConstantCovarianceModel>;
//!
//! // A context whose simulation is just the candidate model.
//! struct Context(Model);
//!
//! impl SimulationContext<Model> for Context {
//!     type Simulation = Model;
//!     fn clone_with_covariance_model(&self, m: Model) -> Result<Self, CalibrationError> {
//!         Ok(Context(m))
//!     }
//!     fn time_discretization(&self) -> &TimeDiscretization {
//!         self.0.time_discretization()
//!     }
//!     fn tenor_discretization(&self) -> &TimeDiscretization {
//!         self.0.tenor_discretization()
//!     }
//!     fn num_factors(&self) -> usize {
//!         1
//!     }
//!     fn build_simulation(
//!         &self,
//!         _: SimulationScheme,
//!         _: &Arc<BrownianMotion>,
//!     ) -> Result<Model, CalibrationError> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
//! let base = ConstantCovarianceModel::new(grid.clone(), grid, 1, 1.0);
//! let model = DisplacedCovarianceModel::new(base, 0.0, true);
//!
//! let instruments: Vec<SharedInstrument<Model>> = [0.01, 0.02, 0.04]
//!     .into_iter()
//!     .map(|level| {
//!         Arc::new(move |_: f64, m: &Model| -> Result<RandomVariable, PricingError> {
//!             let state = [RandomVariable::constant(level)];
//!             m.factor_loading(0, 0, Some(&state[..]))
//!                 .and_then(|loading| loading.into_iter().next())
//!                 .ok_or_else(|| PricingError::ModelFailure("no loading".to_string()))
//!         }) as SharedInstrument<Model>
//!     })
//!     .collect();
//! let targets = [0.04, 0.05, 0.07];
//!
//! let options = CalibrationOptions::default().with_parallel_valuation(false);
//! let calibrated = model
//!     .calibrated_clone(&Context(model.clone()), &instruments, &targets, &[], &options)
//!     .unwrap();
//! assert!((calibrated.displacement().average() - 0.03).abs() < 1e-5);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod calibration;
pub mod solvers;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::calibration::{
        CalibrateCovarianceModel, CalibrationDiagnostics, CalibrationOptions, CalibrationResult,
        CovarianceModelCalibrator, OptionValue, ResidualWeights, TaskExecutor,
    };
    pub use crate::solvers::{
        LevenbergMarquardtFactory, OptimizationProblem, Optimizer, OptimizerFactory,
    };
}
