//! # Replay Test
//!
//! This binary runs a capture of raw simulator messages through the control pipeline without
//! requiring the simulator. It is designed to allow quick investigation of recorded drives.
//!
//! The capture is a text file with one raw message per line, exactly as it was received from the
//! simulator. Blank lines are skipped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{env, fs, time::Instant};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};

use mpc_lib::{
    pipeline::{ControlPipeline, PipelineParams, TickOutcome},
    solver::{KinematicSolver, SolverParams},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Count of the outcome of every tick in the replay.
#[derive(Debug, Default)]
struct ReplaySummary {
    steer: usize,
    manual: usize,
    ignored: usize,
    dropped: usize,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("replay_test", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Replay Test\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let pipeline_params: PipelineParams =
        util::params::load("pipeline.toml").wrap_err("Could not load pipeline params")?;
    let solver_params: SolverParams =
        util::params::load("solver.toml").wrap_err("Could not load solver params")?;

    // ---- LOAD CAPTURE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!("Expected path to a capture file as only argument"));
    }

    info!("Loading capture from \"{}\"", &args[1]);

    let capture = fs::read_to_string(&args[1])
        .wrap_err_with(|| format!("Could not read capture file {}", &args[1]))?;

    // ---- REPLAY ----

    let mut solver = KinematicSolver::new(solver_params, &pipeline_params);
    let pipeline = ControlPipeline::new(pipeline_params);

    let mut summary = ReplaySummary::default();
    let start = Instant::now();

    for (line_num, raw) in capture
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
    {
        match pipeline.tick(raw, &mut solver) {
            Ok(TickOutcome::Steer(cmd)) => {
                debug!(
                    "{:>5}: steer {:+.4}, throttle {:+.4}",
                    line_num + 1, cmd.steering_angle, cmd.throttle
                );
                summary.steer += 1;
            },
            Ok(TickOutcome::Manual) => {
                debug!("{:>5}: manual", line_num + 1);
                summary.manual += 1;
            },
            Ok(TickOutcome::Ignored) => summary.ignored += 1,
            Err(e) => {
                warn!("{:>5}: dropped: {}", line_num + 1, e);
                summary.dropped += 1;
            }
        }
    }

    let total = summary.steer + summary.manual + summary.ignored + summary.dropped;

    info!(
        "Replayed {} messages in {:.3} s",
        total,
        start.elapsed().as_secs_f64()
    );
    info!("{:#?}", summary);

    Ok(())
}
