//! # Pricer Models (L2: Business Logic)
//!
//! Covariance models of the LIBOR market model and the simulation
//! capabilities they are calibrated against.
//!
//! This crate provides:
//! - The [`CovarianceModel`](models::covariance::CovarianceModel) and
//!   [`ParametricCovarianceModel`](models::covariance::ParametricCovarianceModel)
//!   traits
//! - Base models (constant, five-parameter exponential form)
//! - Displaced, blended and stochastic-volatility decorators with joint
//!   parameter vectors
//! - A seeded multi-factor [`BrownianMotion`](simulation::BrownianMotion)
//! - The simulation and instrument contracts consumed by calibration
//!
//! ## Design Principles
//!
//! - **Immutable models**: `with_parameters` returns a new instance
//! - **Static dispatch** through
//!   [`CovarianceModelEnum`](models::covariance::CovarianceModelEnum)
//! - **Unavailable, not failed**: missing loadings are `None`, unsupported
//!   operations are explicit errors
//!
//! ## Example
//!
//! ```
//! use pricer_core::types::{RandomVariable, TimeDiscretization};
//! use pricer_models::models::covariance::{
//!     ConstantCovarianceModel, CovarianceModel, DisplacedCovarianceModel,
//! };
//!
//! let grid = TimeDiscretization::uniform(0.0, 4, 0.5).unwrap();
//! let base = ConstantCovarianceModel::new(grid.clone(), grid, 1, 1.0);
//! let model = DisplacedCovarianceModel::new(base, 0.0, true);
//!
//! let state = vec![RandomVariable::constant(0.04); 4];
//! let loading = model.factor_loading(0, 0, Some(&state[..])).unwrap();
//! assert_eq!(loading[0].average(), 0.04);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod models;
pub mod simulation;
