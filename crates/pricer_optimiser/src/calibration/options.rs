//! Calibration options.
//!
//! Options can be assembled three ways:
//!
//! - [`CalibrationOptions::default`] followed by `with_*` setters
//! - [`CalibrationOptions::from_map`] from an in-memory key/value map
//! - [`CalibrationOptions::from_toml_str`] from a TOML document
//!
//! Recognised keys (camelCase in maps and TOML):
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | `numberOfPaths` | integer | 2000 |
//! | `seed` | integer | 31415 |
//! | `maxIterations` | integer | 400 |
//! | `accuracy` | float | 1e-7 |
//! | `parameterStep` | float | 1e-4 |
//! | `numberOfThreads` | integer | rayon default |
//! | `parallelValuation` | bool | true |
//! | `scheme` | string | `Euler` |
//! | `brownianMotion` | driver (map only) | built from the context |
//! | `optimizerFactory` | factory (map only) | Levenberg-Marquardt, 2 threads |
//!
//! Unknown keys are ignored.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pricer_core::traits::ParameterBounds;
use pricer_core::types::CalibrationError;
use pricer_models::simulation::{BrownianMotion, SimulationScheme};
use serde::Deserialize;

use crate::solvers::OptimizerFactory;

/// Default number of Monte Carlo paths.
pub const DEFAULT_NUMBER_OF_PATHS: usize = 2000;
/// Default seed of the Brownian driver.
pub const DEFAULT_SEED: u64 = 31415;
/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 400;
/// Default required root mean squared error.
pub const DEFAULT_ACCURACY: f64 = 1e-7;
/// Default finite-difference step.
pub const DEFAULT_PARAMETER_STEP: f64 = 1e-4;

/// A value of the in-memory options map.
#[derive(Clone)]
pub enum OptionValue {
    /// Integer option.
    Integer(i64),
    /// Floating-point option.
    Float(f64),
    /// Boolean option.
    Bool(bool),
    /// String option.
    Text(String),
    /// Externally supplied Brownian driver.
    BrownianMotion(Arc<BrownianMotion>),
    /// Externally supplied optimizer factory.
    OptimizerFactory(Arc<dyn OptimizerFactory>),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Integer(_) => "integer",
            OptionValue::Float(_) => "float",
            OptionValue::Bool(_) => "bool",
            OptionValue::Text(_) => "string",
            OptionValue::BrownianMotion(_) => "Brownian motion",
            OptionValue::OptimizerFactory(_) => "optimizer factory",
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Integer(v) => write!(f, "Integer({})", v),
            OptionValue::Float(v) => write!(f, "Float({})", v),
            OptionValue::Bool(v) => write!(f, "Bool({})", v),
            OptionValue::Text(v) => write!(f, "Text({:?})", v),
            OptionValue::BrownianMotion(bm) => write!(f, "BrownianMotion(seed = {})", bm.seed()),
            OptionValue::OptimizerFactory(factory) => write!(f, "OptimizerFactory({:?})", factory),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<Arc<BrownianMotion>> for OptionValue {
    fn from(value: Arc<BrownianMotion>) -> Self {
        OptionValue::BrownianMotion(value)
    }
}

impl From<Arc<dyn OptimizerFactory>> for OptionValue {
    fn from(value: Arc<dyn OptimizerFactory>) -> Self {
        OptionValue::OptimizerFactory(value)
    }
}

/// Settings of one calibration run.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::calibration::CalibrationOptions;
///
/// let options = CalibrationOptions::default()
///     .with_number_of_paths(500)
///     .with_accuracy(1e-9);
/// assert_eq!(options.number_of_paths, 500);
/// assert_eq!(options.seed, 31415);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct CalibrationOptions {
    /// Paths of the default Brownian driver.
    pub number_of_paths: usize,
    /// Seed of the default Brownian driver.
    pub seed: u64,
    /// Optimizer iteration cap.
    pub max_iterations: usize,
    /// Required root mean squared error.
    pub accuracy: f64,
    /// Finite-difference step, the same for every parameter.
    pub parameter_step: f64,
    /// Driver shared by all trials; built from the context when `None`.
    pub brownian_motion: Option<Arc<BrownianMotion>>,
    /// Optimizer factory; Levenberg-Marquardt when `None`.
    pub optimizer_factory: Option<Arc<dyn OptimizerFactory>>,
    /// Per-parameter bounds; unbounded when `None`.
    pub parameter_bounds: Option<Vec<ParameterBounds>>,
    /// Worker threads for instrument valuation; rayon's default when `None`.
    pub number_of_threads: Option<usize>,
    /// Value instruments on a worker pool rather than inline.
    pub parallel_valuation: bool,
    /// Stepping scheme requested from the simulation.
    pub scheme: SimulationScheme,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            number_of_paths: DEFAULT_NUMBER_OF_PATHS,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            accuracy: DEFAULT_ACCURACY,
            parameter_step: DEFAULT_PARAMETER_STEP,
            brownian_motion: None,
            optimizer_factory: None,
            parameter_bounds: None,
            number_of_threads: None,
            parallel_valuation: true,
            scheme: SimulationScheme::Euler,
        }
    }
}

impl fmt::Debug for CalibrationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalibrationOptions")
            .field("number_of_paths", &self.number_of_paths)
            .field("seed", &self.seed)
            .field("max_iterations", &self.max_iterations)
            .field("accuracy", &self.accuracy)
            .field("parameter_step", &self.parameter_step)
            .field(
                "brownian_motion",
                &self.brownian_motion.as_ref().map(|bm| bm.seed()),
            )
            .field("optimizer_factory", &self.optimizer_factory)
            .field("parameter_bounds", &self.parameter_bounds)
            .field("number_of_threads", &self.number_of_threads)
            .field("parallel_valuation", &self.parallel_valuation)
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Scalar options as they appear in TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptionsFile {
    number_of_paths: Option<usize>,
    seed: Option<u64>,
    max_iterations: Option<usize>,
    accuracy: Option<f64>,
    parameter_step: Option<f64>,
    number_of_threads: Option<usize>,
    parallel_valuation: Option<bool>,
    scheme: Option<String>,
}

impl CalibrationOptions {
    /// Set the number of paths.
    pub fn with_number_of_paths(mut self, number_of_paths: usize) -> Self {
        self.number_of_paths = number_of_paths;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the required accuracy.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the finite-difference step.
    pub fn with_parameter_step(mut self, parameter_step: f64) -> Self {
        self.parameter_step = parameter_step;
        self
    }

    /// Use an externally supplied Brownian driver.
    pub fn with_brownian_motion(mut self, brownian_motion: Arc<BrownianMotion>) -> Self {
        self.brownian_motion = Some(brownian_motion);
        self
    }

    /// Use an externally supplied optimizer factory.
    pub fn with_optimizer_factory(mut self, factory: Arc<dyn OptimizerFactory>) -> Self {
        self.optimizer_factory = Some(factory);
        self
    }

    /// Bound the parameters.
    pub fn with_parameter_bounds(mut self, bounds: Vec<ParameterBounds>) -> Self {
        self.parameter_bounds = Some(bounds);
        self
    }

    /// Set the valuation worker count.
    pub fn with_number_of_threads(mut self, number_of_threads: usize) -> Self {
        self.number_of_threads = Some(number_of_threads);
        self
    }

    /// Choose between pooled and inline instrument valuation.
    pub fn with_parallel_valuation(mut self, parallel_valuation: bool) -> Self {
        self.parallel_valuation = parallel_valuation;
        self
    }

    /// Set the simulation scheme.
    pub fn with_scheme(mut self, scheme: SimulationScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Build options from a key/value map, starting from the defaults.
    ///
    /// # Errors
    ///
    /// [`CalibrationError`] with kind `InvalidConfiguration` for a value of
    /// the wrong type or out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use pricer_optimiser::calibration::{CalibrationOptions, OptionValue};
    ///
    /// let mut map = HashMap::new();
    /// map.insert("numberOfPaths".to_string(), OptionValue::from(5000_i64));
    /// map.insert("accuracy".to_string(), OptionValue::from(1e-8));
    /// map.insert("somethingElse".to_string(), OptionValue::from(true));
    ///
    /// let options = CalibrationOptions::from_map(&map).unwrap();
    /// assert_eq!(options.number_of_paths, 5000);
    /// assert_eq!(options.accuracy, 1e-8);
    /// assert_eq!(options.max_iterations, 400);
    /// ```
    pub fn from_map(map: &HashMap<String, OptionValue>) -> Result<Self, CalibrationError> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "numberOfPaths" => options.number_of_paths = count(key, value)?,
                "seed" => options.seed = count(key, value)? as u64,
                "maxIterations" => options.max_iterations = count(key, value)?,
                "accuracy" => options.accuracy = float(key, value)?,
                "parameterStep" => options.parameter_step = float(key, value)?,
                "numberOfThreads" => options.number_of_threads = Some(count(key, value)?),
                "parallelValuation" => match value {
                    OptionValue::Bool(b) => options.parallel_valuation = *b,
                    other => return Err(mistyped(key, "bool", other)),
                },
                "scheme" => match value {
                    OptionValue::Text(s) => options.scheme = parse_scheme(s)?,
                    other => return Err(mistyped(key, "string", other)),
                },
                "brownianMotion" => match value {
                    OptionValue::BrownianMotion(bm) => options.brownian_motion = Some(Arc::clone(bm)),
                    other => return Err(mistyped(key, "Brownian motion", other)),
                },
                "optimizerFactory" => match value {
                    OptionValue::OptimizerFactory(factory) => {
                        options.optimizer_factory = Some(Arc::clone(factory))
                    }
                    other => return Err(mistyped(key, "optimizer factory", other)),
                },
                _ => tracing::trace!(key = key.as_str(), "ignoring unknown calibration option"),
            }
        }
        Ok(options)
    }

    /// Parse the scalar options from TOML, starting from the defaults.
    ///
    /// # Errors
    ///
    /// [`CalibrationError`] with kind `InvalidConfiguration` if the document
    /// does not parse or holds mistyped values.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_optimiser::calibration::CalibrationOptions;
    ///
    /// let options = CalibrationOptions::from_toml_str(r#"
    ///     numberOfPaths = 1000
    ///     seed = 7
    ///     parallelValuation = false
    ///     scheme = "predictor_corrector"
    /// "#).unwrap();
    /// assert_eq!(options.number_of_paths, 1000);
    /// assert!(!options.parallel_valuation);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, CalibrationError> {
        let file: OptionsFile = toml::from_str(content).map_err(|e| {
            CalibrationError::invalid_configuration(format!("Failed to parse TOML: {}", e))
        })?;
        let defaults = Self::default();
        Ok(Self {
            number_of_paths: file.number_of_paths.unwrap_or(defaults.number_of_paths),
            seed: file.seed.unwrap_or(defaults.seed),
            max_iterations: file.max_iterations.unwrap_or(defaults.max_iterations),
            accuracy: file.accuracy.unwrap_or(defaults.accuracy),
            parameter_step: file.parameter_step.unwrap_or(defaults.parameter_step),
            number_of_threads: file.number_of_threads,
            parallel_valuation: file.parallel_valuation.unwrap_or(defaults.parallel_valuation),
            scheme: match file.scheme {
                Some(s) => parse_scheme(&s)?,
                None => defaults.scheme,
            },
            ..defaults
        })
    }

    /// Check the options for consistency.
    ///
    /// # Errors
    ///
    /// [`CalibrationError`] with kind `InvalidConfiguration` for zero paths,
    /// iterations or threads, and for a non-positive or non-finite accuracy
    /// or step.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.number_of_paths == 0 {
            return Err(CalibrationError::invalid_configuration(
                "numberOfPaths must be positive",
            ));
        }
        if self.max_iterations == 0 {
            return Err(CalibrationError::invalid_configuration(
                "maxIterations must be positive",
            ));
        }
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(CalibrationError::invalid_configuration(format!(
                "accuracy must be positive and finite, got {}",
                self.accuracy
            )));
        }
        if !self.parameter_step.is_finite() || self.parameter_step <= 0.0 {
            return Err(CalibrationError::invalid_configuration(format!(
                "parameterStep must be positive and finite, got {}",
                self.parameter_step
            )));
        }
        if self.number_of_threads == Some(0) {
            return Err(CalibrationError::invalid_configuration(
                "numberOfThreads must be positive",
            ));
        }
        Ok(())
    }
}

fn mistyped(key: &str, expected: &str, got: &OptionValue) -> CalibrationError {
    CalibrationError::invalid_configuration(format!(
        "option '{}' expects {}, got {}",
        key,
        expected,
        got.type_name()
    ))
}

fn count(key: &str, value: &OptionValue) -> Result<usize, CalibrationError> {
    match value {
        OptionValue::Integer(i) => usize::try_from(*i).map_err(|_| {
            CalibrationError::invalid_configuration(format!(
                "option '{}' must be non-negative, got {}",
                key, i
            ))
        }),
        other => Err(mistyped(key, "integer", other)),
    }
}

fn float(key: &str, value: &OptionValue) -> Result<f64, CalibrationError> {
    match value {
        OptionValue::Float(x) => Ok(*x),
        OptionValue::Integer(i) => Ok(*i as f64),
        other => Err(mistyped(key, "float", other)),
    }
}

fn parse_scheme(s: &str) -> Result<SimulationScheme, CalibrationError> {
    s.parse().map_err(CalibrationError::invalid_configuration)
}
