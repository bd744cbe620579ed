//! Seeded multi-factor Brownian driver.
//!
//! [`BrownianMotion`] produces the increments `ΔW(n, f)` of `num_factors`
//! independent Brownian motions on a time grid, one realisation per path.
//! Increments are generated once, on first access, from a `StdRng` seeded
//! with the driver's seed, so two drivers with equal inputs are identical.
//!
//! The driver is immutable after construction and is shared read-only
//! between concurrent calibration trials through an `Arc`.

use std::sync::OnceLock;

use pricer_core::types::{ModelError, RandomVariable, TimeDiscretization};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Multi-factor Brownian increments on a time grid.
///
/// # Examples
///
/// ```
/// use pricer_core::types::TimeDiscretization;
/// use pricer_models::simulation::BrownianMotion;
///
/// let grid = TimeDiscretization::uniform(0.0, 4, 0.25).unwrap();
/// let bm = BrownianMotion::new(grid, 2, 1000, 31415).unwrap();
///
/// let dw = bm.increment(0, 1).unwrap();
/// assert_eq!(dw.size(), 1000);
/// assert!(bm.increment(4, 0).is_none()); // no step after the last time
/// ```
#[derive(Debug)]
pub struct BrownianMotion {
    time_discretization: TimeDiscretization,
    num_factors: usize,
    num_paths: usize,
    seed: u64,
    /// Indexed `[time_index][factor]`.
    increments: OnceLock<Vec<Vec<RandomVariable>>>,
}

impl BrownianMotion {
    /// Create a driver.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] if `num_paths == 0`.
    pub fn new(
        time_discretization: TimeDiscretization,
        num_factors: usize,
        num_paths: usize,
        seed: u64,
    ) -> Result<Self, ModelError> {
        if num_paths == 0 {
            return Err(ModelError::InvalidParameter(
                "Brownian motion needs at least one path".to_string(),
            ));
        }
        Ok(Self {
            time_discretization,
            num_factors,
            num_paths,
            seed,
            increments: OnceLock::new(),
        })
    }

    /// Time grid of the increments.
    #[inline]
    pub fn time_discretization(&self) -> &TimeDiscretization {
        &self.time_discretization
    }

    /// Number of independent factors.
    #[inline]
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    /// Number of Monte Carlo paths.
    #[inline]
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    /// Seed of the underlying generator.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Increment `W(t_{n+1}) - W(t_n)` of the given factor.
    ///
    /// Returns `None` for `time_index >= num_time_steps` or `factor >= num_factors`.
    pub fn increment(&self, time_index: usize, factor: usize) -> Option<&RandomVariable> {
        self.increments
            .get_or_init(|| self.generate())
            .get(time_index)?
            .get(factor)
    }

    /// A deterministic value with this driver's path count semantics.
    #[inline]
    pub fn random_variable_for_constant(&self, value: f64) -> RandomVariable {
        RandomVariable::constant(value)
    }

    fn generate(&self) -> Vec<Vec<RandomVariable>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n_steps = self.time_discretization.num_time_steps();
        tracing::debug!(
            seed = self.seed,
            n_steps,
            factors = self.num_factors,
            paths = self.num_paths,
            "generating Brownian increments"
        );

        (0..n_steps)
            .map(|n| {
                let t = self.time_discretization.time(n);
                let sqrt_dt = self.time_discretization.time_step(n).sqrt();
                (0..self.num_factors)
                    .map(|_| {
                        let draws = (0..self.num_paths)
                            .map(|_| {
                                let z: f64 = StandardNormal.sample(&mut rng);
                                z * sqrt_dt
                            })
                            .collect();
                        RandomVariable::from_realizations(t, draws)
                    })
                    .collect()
            })
            .collect()
    }
}
