//! Integration tests for the covariance model calibration engine.
//!
//! These tests drive the engine through stub simulation contexts and
//! instruments, checking parameter recovery, the instrument failure policy,
//! result ordering and the equivalence of the two execution backends.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use approx::assert_relative_eq;
use common::{
    failing_instrument, forward_levels, grid, init_tracing, jittered_instrument,
    loading_instrument, loading_instrument_at, panicking_instrument, BrokenFactory,
    RecordingFactory, StubContext, StubSimulation, N_PERIODS,
};
use pricer_core::traits::ParameterBounds;
use pricer_core::types::{PricingError, SolverError};
use pricer_models::models::covariance::{
    ConstantCovarianceModel, CovarianceModel, CovarianceModelEnum, DisplacedCovarianceModel,
    ExponentialFormCovarianceModel, ParametricCovarianceModel, StochasticVolatilityCovarianceModel,
};
use pricer_models::simulation::{BrownianMotion, CalibrationInstrument, SharedInstrument};
use pricer_optimiser::calibration::{
    CalibrateCovarianceModel, CalibrationObjective, CalibrationOptions, CovarianceModelCalibrator,
    OptionValue, TaskExecutor,
};
use pricer_optimiser::solvers::{LevenbergMarquardtFactory, OptimizerFactory};

type Displaced = DisplacedCovarianceModel<ConstantCovarianceModel>;
type Heston = StochasticVolatilityCovarianceModel<Displaced>;

const TRUE_DISPLACEMENT: f64 = 0.03;

fn unit_loadings() -> ConstantCovarianceModel {
    ConstantCovarianceModel::new(grid(), grid(), 1, 1.0)
}

fn displaced(initial: f64) -> Displaced {
    DisplacedCovarianceModel::new(unit_loadings(), initial, true)
}

/// Targets `state[c] + d_true` for the first `n` components.
fn displaced_targets(n: usize) -> Vec<f64> {
    forward_levels()
        .iter()
        .take(n)
        .map(|level| level.average() + TRUE_DISPLACEMENT)
        .collect()
}

fn displaced_instruments(n: usize) -> Vec<SharedInstrument<StubSimulation<Displaced>>> {
    (0..n).map(loading_instrument).collect()
}

/// Displaced unit loadings under stochastic volatility; parameters are
/// `[d, κ, θ, ξ]`.
fn heston(d: f64, kappa: f64, theta: f64, xi: f64) -> Heston {
    let driver = Arc::new(BrownianMotion::new(grid(), 1, 200, 19).unwrap());
    StochasticVolatilityCovarianceModel::new(displaced(d), driver, kappa, theta, xi, true)
}

/// One instrument per (time index ≥ 1, component), where the variance
/// scaling is stochastic.
fn heston_instruments() -> Vec<SharedInstrument<StubSimulation<Heston>>> {
    (1..=N_PERIODS)
        .flat_map(|t| (0..N_PERIODS).map(move |c| loading_instrument_at(t, c)))
        .collect()
}

fn model_values<M: CovarianceModel + Clone>(
    model: &M,
    instruments: &[SharedInstrument<StubSimulation<M>>],
) -> Vec<f64> {
    let simulation = StubSimulation {
        model: model.clone(),
        state: forward_levels().into(),
    };
    instruments
        .iter()
        .map(|i| i.value(0.0, &simulation).unwrap().average())
        .collect()
}

fn rmse(values: &[f64], targets: &[f64]) -> f64 {
    let ss: f64 = values.iter().zip(targets).map(|(v, t)| (v - t).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

// ============================================================================
// End-to-end recovery
// ============================================================================

#[test]
fn test_recovers_displacement_with_default_options() {
    init_tracing();
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);

    let result = CovarianceModelCalibrator::default()
        .calibrate(&model, &context, &displaced_instruments(3), &displaced_targets(3), &[])
        .unwrap();

    assert!(result.is_success());
    assert_relative_eq!(result.parameters[0], TRUE_DISPLACEMENT, epsilon = 1e-5);
    assert_relative_eq!(
        result.model.displacement().average(),
        TRUE_DISPLACEMENT,
        epsilon = 1e-5
    );
    assert_eq!(result.diagnostics.instrument_errors.len(), 3);
    assert!(result.diagnostics.max_error < 1e-5);
}

#[test]
fn test_calibrated_clone_through_enum_chain() {
    let model = CovarianceModelEnum::displaced(unit_loadings().into(), 0.0, true);
    let context = StubContext::new(model.clone(), 1);
    let instruments: Vec<SharedInstrument<StubSimulation<CovarianceModelEnum>>> =
        (0..3).map(loading_instrument).collect();

    let calibrated = model
        .calibrated_clone(
            &context,
            &instruments,
            &displaced_targets(3),
            &[],
            &CalibrationOptions::default().with_number_of_threads(2),
        )
        .unwrap();

    assert_relative_eq!(
        calibrated.parameters().to_scalars()[0],
        TRUE_DISPLACEMENT,
        epsilon = 1e-5
    );
}

#[test]
fn test_weights_do_not_move_an_exact_fit() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let result = CovarianceModelCalibrator::default()
        .calibrate(
            &model,
            &context,
            &displaced_instruments(3),
            &displaced_targets(3),
            &[4.0, 0.5, 1.0],
        )
        .unwrap();
    assert_relative_eq!(result.parameters[0], TRUE_DISPLACEMENT, epsilon = 1e-5);
}

#[test]
fn test_bounds_are_respected() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let options = CalibrationOptions::default()
        .with_parameter_bounds(vec![ParameterBounds::new(-0.01, 0.01)])
        .with_max_iterations(50);

    let result = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &displaced_instruments(3), &displaced_targets(3), &[])
        .unwrap();

    let d = result.parameters[0];
    assert!(d <= 0.01 && d > 0.009, "displacement {} should sit at the upper bound", d);
}

#[test]
fn test_exponential_form_started_at_its_optimum_stays_there() {
    let model = ExponentialFormCovarianceModel::new(grid(), grid(), 2, [0.1, 0.2, 0.5, 0.05, 0.3])
        .unwrap();
    let context = StubContext::new(model.clone(), 2);
    let instruments: Vec<SharedInstrument<StubSimulation<ExponentialFormCovarianceModel>>> =
        (0..4).map(loading_instrument).collect();
    let targets = CalibrationObjective::new(
        &model,
        &context,
        &instruments,
        &[0.0; 4],
        Arc::new(BrownianMotion::new(grid(), 2, 1, 1).unwrap()),
        Default::default(),
        &TaskExecutor::Inline,
    )
    .unwrap()
    .values(&model.parameters().to_scalars())
    .unwrap();

    let result = CovarianceModelCalibrator::default()
        .calibrate(&model, &context, &instruments, &targets, &[])
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.diagnostics.iterations, 0);
    assert_eq!(result.parameters, model.parameters().to_scalars());
    assert_eq!(result.model, model);
}

// ============================================================================
// Instrument failure policy
// ============================================================================

#[test]
fn test_failing_instrument_contributes_its_target() {
    init_tracing();
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);

    let mut instruments = displaced_instruments(4);
    instruments.insert(2, failing_instrument());
    let mut targets = displaced_targets(4);
    targets.insert(2, 0.123);

    let factory = RecordingFactory::new(vec![vec![0.0], vec![0.01], vec![0.05], vec![-0.2]]);
    let options = CalibrationOptions::default().with_optimizer_factory(Arc::new(factory.clone()));

    let result = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &instruments, &targets, &[])
        .unwrap();

    let recorded = factory.recorded();
    assert_eq!(recorded.len(), 4);
    for values in &recorded {
        assert_eq!(values.len(), 5);
        assert_eq!(values[2], 0.123);
    }
    // Healthy instruments still see the trial displacement.
    let levels = forward_levels();
    assert_relative_eq!(recorded[1][0], levels[0].average() + 0.01, epsilon = 1e-15);
    assert_relative_eq!(recorded[3][4], levels[3].average() - 0.2, epsilon = 1e-15);
    assert_eq!(result.parameters, vec![-0.2]);
    assert_eq!(result.diagnostics.instrument_errors[2], 0.0);
}

#[test]
fn test_panicking_instrument_contributes_its_target() {
    init_tracing();
    for parallel in [true, false] {
        let model = displaced(0.0);
        let context = StubContext::new(model.clone(), 1);

        let mut instruments = displaced_instruments(4);
        instruments.insert(3, panicking_instrument());
        let mut targets = displaced_targets(4);
        targets.insert(3, 0.456);

        let options = CalibrationOptions::default()
            .with_parallel_valuation(parallel)
            .with_number_of_threads(2);
        let result = CovarianceModelCalibrator::new(options)
            .calibrate(&model, &context, &instruments, &targets, &[])
            .unwrap();

        assert!(result.is_success(), "parallel = {}", parallel);
        assert_relative_eq!(result.parameters[0], TRUE_DISPLACEMENT, epsilon = 1e-5);
        assert_eq!(result.diagnostics.instrument_errors.len(), 5);
        assert_eq!(result.diagnostics.instrument_errors[3], 0.0);
    }
}

#[test]
fn test_panicking_instrument_outcome_is_a_model_failure() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let instruments = vec![loading_instrument(0), panicking_instrument()];
    let objective = CalibrationObjective::new(
        &model,
        &context,
        &instruments,
        &[0.0, 0.0],
        Arc::new(BrownianMotion::new(grid(), 1, 1, 1).unwrap()),
        Default::default(),
        &TaskExecutor::Inline,
    )
    .unwrap();

    let outcomes = objective.evaluate(&[0.01]).unwrap();
    assert!(outcomes[0].is_ok());
    let err = outcomes[1].as_ref().unwrap_err();
    assert!(matches!(err, PricingError::ModelFailure(_)));
    assert!(err.to_string().contains("panicked"));
}

#[test]
fn test_every_instrument_failing_still_completes() {
    let model = displaced(0.01);
    let context = StubContext::new(model.clone(), 1);
    let instruments: Vec<_> = (0..3).map(|_| failing_instrument::<Displaced>()).collect();

    let result = CovarianceModelCalibrator::default()
        .calibrate(&model, &context, &instruments, &[0.1, 0.2, 0.3], &[])
        .unwrap();

    assert!(result.diagnostics.max_error == 0.0);
    assert_relative_eq!(result.parameters[0], 0.01, epsilon = 1e-12);
}

// ============================================================================
// Ordering and execution backends
// ============================================================================

#[test]
fn test_values_keep_instrument_order_under_jitter() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let n = 24;
    let instruments: Vec<_> = (0..n)
        .map(|i| jittered_instrument::<Displaced>(i as f64, 8))
        .collect();
    let targets = vec![0.0; n];

    for executor in [TaskExecutor::worker_pool(Some(6)), TaskExecutor::Inline] {
        let objective = CalibrationObjective::new(
            &model,
            &context,
            &instruments,
            &targets,
            Arc::new(BrownianMotion::new(grid(), 1, 1, 1).unwrap()),
            Default::default(),
            &executor,
        )
        .unwrap();
        let values = objective.values(&[0.0]).unwrap();
        assert_eq!(values, (0..n).map(|i| i as f64).collect::<Vec<_>>());
    }
}

#[test]
fn test_inline_and_pooled_valuation_agree() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let instruments = displaced_instruments(4);
    let targets = displaced_targets(4);

    let pooled = CovarianceModelCalibrator::new(CalibrationOptions::default().with_number_of_threads(3))
        .calibrate(&model, &context, &instruments, &targets, &[])
        .unwrap();
    let inline = CovarianceModelCalibrator::new(CalibrationOptions::default().with_parallel_valuation(false))
        .calibrate(&model, &context, &instruments, &targets, &[])
        .unwrap();

    assert_eq!(pooled.parameters, inline.parameters);
    assert_eq!(pooled.diagnostics.iterations, inline.diagnostics.iterations);
    assert_eq!(
        pooled.diagnostics.instrument_errors,
        inline.diagnostics.instrument_errors
    );
}

// ============================================================================
// Concurrent trials
// ============================================================================

#[test]
fn test_objective_is_reentrant_across_threads() {
    let model = heston(0.0, 1.0, 1.0, 0.3);
    let context = StubContext::new(model.clone(), 1);
    let instruments = heston_instruments();
    let targets = vec![0.0; instruments.len()];
    let executor = TaskExecutor::worker_pool(Some(2));
    let objective = CalibrationObjective::new(
        &model,
        &context,
        &instruments,
        &targets,
        Arc::new(BrownianMotion::new(grid(), 1, 1, 1).unwrap()),
        Default::default(),
        &executor,
    )
    .unwrap();

    let trials: Vec<Vec<f64>> = (0..8)
        .map(|i| {
            let x = i as f64;
            vec![0.005 * x, 0.5 + 0.2 * x, 0.6 + 0.1 * x, 0.1 + 0.05 * x]
        })
        .collect();
    let sequential: Vec<Vec<f64>> = trials.iter().map(|t| objective.values(t).unwrap()).collect();

    let objective = &objective;
    let concurrent: Vec<Vec<f64>> = thread::scope(|scope| {
        let handles: Vec<_> = trials
            .iter()
            .map(|t| scope.spawn(move || objective.values(t).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(concurrent, sequential);
    assert_eq!(objective.evaluations(), 2 * trials.len());
    assert!(sequential.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn test_stochastic_volatility_calibration_is_jacobian_thread_invariant() {
    init_tracing();
    let truth = heston(0.02, 1.2, 0.9, 0.35);
    let start = heston(0.0, 0.8, 1.1, 0.2);
    let context = StubContext::new(start.clone(), 1);
    let instruments = heston_instruments();
    let targets = model_values(&truth, &instruments);
    let initial_rmse = rmse(&model_values(&start, &instruments), &targets);
    let bounds = vec![
        ParameterBounds::new(-0.01, 0.05),
        ParameterBounds::new(0.05, 5.0),
        ParameterBounds::new(0.05, 5.0),
        ParameterBounds::new(0.01, 2.0),
    ];

    let run = |jacobian_threads: usize| {
        let options = CalibrationOptions::default()
            .with_parameter_bounds(bounds.clone())
            .with_max_iterations(25)
            .with_number_of_threads(2)
            .with_optimizer_factory(Arc::new(LevenbergMarquardtFactory::new(jacobian_threads)));
        CovarianceModelCalibrator::new(options)
            .calibrate(&start, &context, &instruments, &targets, &[])
            .unwrap()
    };
    let sequential = run(1);
    let concurrent = run(4);

    assert_eq!(sequential.parameters.len(), 4);
    assert!(sequential.diagnostics.iterations >= 1);
    assert!(
        sequential.diagnostics.rmse < initial_rmse,
        "rmse {} did not improve on {}",
        sequential.diagnostics.rmse,
        initial_rmse
    );
    assert_eq!(concurrent.parameters, sequential.parameters);
    assert_eq!(concurrent.diagnostics.iterations, sequential.diagnostics.iterations);
    assert_eq!(
        concurrent.diagnostics.instrument_errors,
        sequential.diagnostics.instrument_errors
    );
}

// ============================================================================
// Configuration and failures
// ============================================================================

#[test]
fn test_options_from_map_drive_the_run() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let factory = RecordingFactory::new(vec![vec![0.02]]);

    let mut map = HashMap::new();
    map.insert("numberOfPaths".to_string(), OptionValue::from(10_i64));
    map.insert(
        "optimizerFactory".to_string(),
        OptionValue::from(Arc::new(factory.clone()) as Arc<dyn OptimizerFactory>),
    );
    map.insert("parallelValuation".to_string(), OptionValue::from(false));
    let options = CalibrationOptions::from_map(&map).unwrap();

    let result = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &displaced_instruments(2), &displaced_targets(2), &[])
        .unwrap();
    assert_eq!(factory.recorded().len(), 1);
    assert_eq!(result.parameters, vec![0.02]);
    assert_eq!(result.model.displacement().average(), 0.02);
}

#[test]
fn test_supplied_driver_must_cover_the_factors() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 3);
    let driver = Arc::new(BrownianMotion::new(grid(), 1, 100, 5).unwrap());
    let options = CalibrationOptions::default().with_brownian_motion(driver);

    let err = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &displaced_instruments(2), &displaced_targets(2), &[])
        .unwrap_err();
    assert!(err.is_invalid_configuration());
}

#[test]
fn test_solver_failure_is_wrapped() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let options = CalibrationOptions::default().with_optimizer_factory(Arc::new(BrokenFactory));

    let err = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &displaced_instruments(2), &displaced_targets(2), &[])
        .unwrap_err();

    assert!(err.is_solver_failure());
    let source = std::error::Error::source(&err)
        .and_then(|s| s.downcast_ref::<SolverError>())
        .expect("solver error preserved as source");
    assert!(matches!(source, SolverError::NumericalInstability(_)));
}

#[test]
fn test_best_fit_revaluation_failure_keeps_the_result() {
    init_tracing();
    let model = displaced(0.01);
    let context = StubContext::new(model.clone(), 1).with_failing_simulation();
    let factory = RecordingFactory::new(Vec::new());
    let options = CalibrationOptions::default().with_optimizer_factory(Arc::new(factory));

    let result = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &displaced_instruments(2), &displaced_targets(2), &[])
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.parameters, vec![0.01]);
    assert!(result.diagnostics.instrument_errors.is_empty());
    assert_eq!(result.diagnostics.max_error, 0.0);
}

#[test]
fn test_mismatched_bounds_are_rejected() {
    let model = displaced(0.0);
    let context = StubContext::new(model.clone(), 1);
    let options = CalibrationOptions::default().with_parameter_bounds(vec![
        ParameterBounds::new(0.0, 1.0),
        ParameterBounds::new(0.0, 1.0),
    ]);

    let err = CovarianceModelCalibrator::new(options)
        .calibrate(&model, &context, &displaced_instruments(2), &displaced_targets(2), &[])
        .unwrap_err();
    assert!(err.is_invalid_configuration());
}
