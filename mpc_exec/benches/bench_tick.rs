//! # Pipeline Tick Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use comms_if::sim::{self, Telemetry};
use mpc_lib::{
    pipeline::{ControlPipeline, PipelineParams},
    solver::{KinematicSolver, Solver, SolverParams},
};
use util::maths::polyfit;

fn tick_benchmark(c: &mut Criterion) {
    // ---- Build a telemetry frame on a gentle curve ----

    let ptsx: Vec<f64> = (0..6).map(|i| 100.0 + 12.0 * i as f64).collect();
    let ptsy: Vec<f64> = ptsx.iter().map(|x| 0.002 * (x - 100.0).powi(2) - 5.0).collect();

    let raw = sim::encode(
        sim::TELEMETRY_EVENT,
        &Telemetry {
            waypoints_x_m: ptsx.clone(),
            waypoints_y_m: ptsy.clone(),
            pos_x_m: 95.0,
            pos_y_m: -4.5,
            heading_rad: 0.05,
            speed: 35.0,
            steering_ratio: -0.02,
            throttle: 0.3,
        },
    )
    .unwrap();

    let pipeline_params = PipelineParams::default();
    let mut solver = KinematicSolver::new(SolverParams::default(), &pipeline_params);
    let pipeline = ControlPipeline::new(pipeline_params);

    // Bench the full tick
    c.bench_function("ControlPipeline::tick", |b| {
        b.iter(|| pipeline.tick(&raw, &mut solver).unwrap())
    });

    // Bench the fit on its own
    c.bench_function("polyfit", |b| b.iter(|| polyfit(&ptsx, &ptsy, 3).unwrap()));

    // Bench the solver on its own
    let coeffs = polyfit(&ptsx, &ptsy, 3).unwrap();
    let state = mpc_lib::latency::ControlState::at_origin(35.0, 0.5, 0.01);
    c.bench_function("KinematicSolver::solve", |b| {
        b.iter(|| solver.solve(&state, &coeffs).unwrap())
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
