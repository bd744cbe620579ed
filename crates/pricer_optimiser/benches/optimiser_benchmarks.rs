//! Benchmarks for pricer_optimiser.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::types::{CalibrationError, PricingError, RandomVariable, SolverError, TimeDiscretization};
use pricer_models::models::covariance::{
    CovarianceModel, CovarianceModelEnum, ExponentialFormCovarianceModel,
};
use pricer_models::simulation::{BrownianMotion, SharedInstrument, SimulationContext, SimulationScheme};
use pricer_optimiser::calibration::{CalibrationOptions, CovarianceModelCalibrator};
use pricer_optimiser::solvers::{LevenbergMarquardtFactory, OptimizationProblem, OptimizerFactory};

const N_PERIODS: usize = 10;

/// Context whose simulation is the candidate model itself.
struct ModelContext {
    model: CovarianceModelEnum,
    grid: TimeDiscretization,
}

impl SimulationContext<CovarianceModelEnum> for ModelContext {
    type Simulation = CovarianceModelEnum;

    fn clone_with_covariance_model(
        &self,
        covariance_model: CovarianceModelEnum,
    ) -> Result<Self, CalibrationError> {
        Ok(Self {
            model: covariance_model,
            grid: self.grid.clone(),
        })
    }

    fn time_discretization(&self) -> &TimeDiscretization {
        &self.grid
    }

    fn tenor_discretization(&self) -> &TimeDiscretization {
        &self.grid
    }

    fn num_factors(&self) -> usize {
        2
    }

    fn build_simulation(
        &self,
        _scheme: SimulationScheme,
        _brownian_motion: &Arc<BrownianMotion>,
    ) -> Result<CovarianceModelEnum, CalibrationError> {
        Ok(self.model.clone())
    }
}

fn loading_instrument(component: usize) -> SharedInstrument<CovarianceModelEnum> {
    Arc::new(
        move |_t: f64, model: &CovarianceModelEnum| -> Result<RandomVariable, PricingError> {
            let state: Vec<RandomVariable> = (0..N_PERIODS)
                .map(|i| RandomVariable::constant(0.02 + 0.002 * i as f64))
                .collect();
            model
                .factor_loading(1, component, Some(&state[..]))
                .and_then(|loading| loading.into_iter().next())
                .ok_or_else(|| PricingError::ModelFailure("factor loading unavailable".to_string()))
        },
    )
}

fn benchmark_levenberg_marquardt(c: &mut Criterion) {
    let objective = |p: &[f64]| Ok::<_, SolverError>(vec![1.0 - p[0], 10.0 * (p[1] - p[0] * p[0])]);

    c.bench_function("lm_rosenbrock", |b| {
        b.iter(|| {
            let problem = OptimizationProblem::new(&objective, black_box(vec![-1.0, 1.0]), vec![0.0, 0.0]);
            let mut optimizer = LevenbergMarquardtFactory::new(1).create(problem);
            let _ = optimizer.run();
            black_box(optimizer.best_fit_parameters().to_vec())
        })
    });
}

fn benchmark_displacement_calibration(c: &mut Criterion) {
    let mut group = c.benchmark_group("displacement_calibration");
    let grid = TimeDiscretization::uniform(0.0, N_PERIODS, 0.5).unwrap();
    let base = ExponentialFormCovarianceModel::new(grid.clone(), grid.clone(), 2, [0.1, 0.1, 0.5, 0.05, 0.1])
        .unwrap();
    let truth = CovarianceModelEnum::displaced(base.clone().into(), 0.02, true);
    let model = CovarianceModelEnum::displaced(base.into(), 0.0, true);
    let context = ModelContext {
        model: model.clone(),
        grid,
    };
    let instruments: Vec<_> = (0..N_PERIODS).map(loading_instrument).collect();
    let targets: Vec<f64> = instruments
        .iter()
        .map(|i| i.value(0.0, &truth).map(|v| v.average()).unwrap_or(0.0))
        .collect();

    for parallel in [false, true] {
        let calibrator = CovarianceModelCalibrator::new(
            CalibrationOptions::default()
                .with_parallel_valuation(parallel)
                .with_number_of_threads(2),
        );
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "pooled" } else { "inline" }),
            &calibrator,
            |b, calibrator| {
                b.iter(|| {
                    calibrator
                        .calibrate(&model, &context, &instruments, black_box(&targets), &[])
                        .map(|r| r.parameters)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_levenberg_marquardt,
    benchmark_displacement_calibration,
);
criterion_main!(benches);
