//! Main bridge executable entry point.
//!
//! # Architecture
//!
//! The bridge sits between the vehicle simulator and the trajectory solver:
//!
//!     - Initialise the session, logging and parameters
//!     - Bind the simulator server
//!     - For each simulator connection, on its own thread:
//!         - Decode and validate telemetry
//!         - Fit the reference path and compute the tracking errors
//!         - Compensate for the actuation latency
//!         - Solve
//!         - Send the steering command back after the actuation delay
//!
//! The software root must be given by the `MPC_BRIDGE_SW_ROOT` environment variable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;
use color_eyre::{Report, eyre::WrapErr};
use log::info;

// Internal
use mpc_lib::{
    params::MpcExecParams,
    pipeline::{ControlPipeline, PipelineParams},
    sim_server::SimServer,
    solver::{KinematicSolver, Solver, SolverFactory, SolverParams},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "mpc_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("MPC Bridge Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: MpcExecParams = util::params::load(
        "mpc_exec.toml"
    ).wrap_err("Could not load exec params")?;

    let pipeline_params: PipelineParams = util::params::load(
        "pipeline.toml"
    ).wrap_err("Could not load pipeline params")?;

    let solver_params: SolverParams = util::params::load(
        "solver.toml"
    ).wrap_err("Could not load solver params")?;

    info!("Parameters loaded");

    // ---- INITIALISE PIPELINE ----

    let solver_factory: Arc<dyn SolverFactory> = {
        let pipeline_params = pipeline_params.clone();
        Arc::new(move || -> Box<dyn Solver> {
            Box::new(KinematicSolver::new(solver_params.clone(), &pipeline_params))
        })
    };

    let pipeline = ControlPipeline::new(pipeline_params);

    // ---- RUN SERVER ----

    let server = SimServer::bind(&exec_params, pipeline, solver_factory)
        .wrap_err("Failed to start the simulator server")?;

    server.run().wrap_err("Simulator server failed")?;

    info!("End of execution");

    Ok(())
}
