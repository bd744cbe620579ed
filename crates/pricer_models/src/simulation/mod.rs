//! Capabilities consumed from the surrounding Monte Carlo framework.
//!
//! Calibration treats the term-structure simulation and the products it
//! values as opaque collaborators. This module defines the narrow contracts
//! it needs from them:
//!
//! - [`SimulationContext`]: curves and tenor structure able to produce a
//!   clone with a substituted covariance model, and to build a path
//!   simulation over it
//! - [`CalibrationInstrument`]: a product exposing `value(time, simulation)`
//! - [`BrownianMotion`]: the seeded driver shared by all trial simulations
//! - [`SimulationScheme`]: stepping scheme requested from the simulation

use std::sync::Arc;

use pricer_core::types::{CalibrationError, PricingError, RandomVariable, TimeDiscretization};

mod brownian;

pub use brownian::BrownianMotion;

/// Stepping scheme of the path simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulationScheme {
    /// Euler scheme on the log of the state.
    #[default]
    Euler,
    /// Euler scheme on a functional of the state.
    EulerFunctional,
    /// Predictor-corrector drift.
    PredictorCorrector,
}

impl std::str::FromStr for SimulationScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "euler" => Ok(SimulationScheme::Euler),
            "eulerfunctional" => Ok(SimulationScheme::EulerFunctional),
            "predictorcorrector" => Ok(SimulationScheme::PredictorCorrector),
            other => Err(format!("unknown simulation scheme '{}'", other)),
        }
    }
}

/// Model context able to rebuild itself around a new covariance model.
///
/// `M` is the covariance model type being calibrated. Implementations hold
/// the remaining model data (curves, measure, discretizations) and must be
/// safe to share between the concurrent trials of one calibration.
pub trait SimulationContext<M>: Sized + Send + Sync {
    /// Path simulation handed to calibration instruments.
    type Simulation: Send + Sync;

    /// Clone of this context with `covariance_model` substituted.
    fn clone_with_covariance_model(&self, covariance_model: M) -> Result<Self, CalibrationError>;

    /// Simulation time grid.
    fn time_discretization(&self) -> &TimeDiscretization;

    /// Tenor (LIBOR period) grid.
    fn tenor_discretization(&self) -> &TimeDiscretization;

    /// Number of driving factors.
    fn num_factors(&self) -> usize;

    /// Build a path simulation of this context driven by `brownian_motion`.
    fn build_simulation(
        &self,
        scheme: SimulationScheme,
        brownian_motion: &Arc<BrownianMotion>,
    ) -> Result<Self::Simulation, CalibrationError>;
}

/// A product used as a calibration target.
///
/// Closures `Fn(f64, &S) -> Result<RandomVariable, PricingError>` implement
/// this trait directly.
pub trait CalibrationInstrument<S>: Send + Sync {
    /// Value at `evaluation_time` under `simulation`.
    fn value(&self, evaluation_time: f64, simulation: &S) -> Result<RandomVariable, PricingError>;
}

/// Instrument shared between the concurrent trials of a calibration.
pub type SharedInstrument<S> = Arc<dyn CalibrationInstrument<S>>;

impl<S, F> CalibrationInstrument<S> for F
where
    F: Fn(f64, &S) -> Result<RandomVariable, PricingError> + Send + Sync,
{
    fn value(&self, evaluation_time: f64, simulation: &S) -> Result<RandomVariable, PricingError> {
        self(evaluation_time, simulation)
    }
}
