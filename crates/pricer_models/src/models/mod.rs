//! Term-structure model components.
//!
//! Currently the covariance (factor-loading) layer of the LIBOR market
//! model; see [`covariance`].

pub mod covariance;

pub use covariance::{CovarianceModel, CovarianceModelEnum, ParametricCovarianceModel};
