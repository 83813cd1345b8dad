//! # Control pipeline
//!
//! Turns one raw inbound simulator message into at most one outbound response. A telemetry tick
//! runs through the following stages:
//!
//! 1. Decode the frame.
//! 2. Validate the telemetry.
//! 3. Transform the waypoints into the vehicle frame.
//! 4. Fit the reference path polynomial and derive the cross track and heading errors.
//! 5. Project the state forward by the actuation latency.
//! 6. Solve.
//! 7. Build the steering command.
//!
//! The pipeline holds no mutable state and can be shared between connections. Each connection
//! provides its own [`Solver`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::PipelineParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};

// Internal
use comms_if::sim::{self, FrameError, SimFrame, SteerCmd, Telemetry};
use util::maths::{polyfit, PolyCoeffs, PolyFitError};

use crate::{
    frame_transform::{zip_points, VehiclePose},
    latency::{ControlState, LatencyProjector},
    solver::{Solver, SolverError, SolverResult},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control pipeline.
#[derive(Debug, Clone)]
pub struct ControlPipeline {
    params: PipelineParams,

    projector: LatencyProjector,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The result of a successful tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The message needs no response.
    Ignored,

    /// The simulator had no data, control is handed back to the user.
    Manual,

    /// A steering command to send to the simulator.
    Steer(SteerCmd),
}

/// Reasons telemetry is rejected before any processing.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Telemetry contains {x} waypoint X values but {y} Y values")]
    LengthMismatch {
        x: usize,
        y: usize
    },

    #[error("Telemetry contains {found} waypoints but at least {required} are required")]
    InsufficientPoints {
        found: usize,
        required: usize
    },

    #[error("Telemetry contains a non-finite value")]
    NonFinite,
}

/// Errors which cause a tick to be dropped.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] FrameError),

    #[error("Invalid telemetry: {0}")]
    Validation(#[from] ValidationError),

    #[error("Could not fit the reference path: {0}")]
    Numeric(#[from] PolyFitError),

    #[error("Solver failed: {0}")]
    Solver(#[from] SolverError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlPipeline {
    pub fn new(params: PipelineParams) -> Self {
        let projector = LatencyProjector::new(params.latency_s, params.wheelbase_m);

        Self {
            params,
            projector
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Process one raw inbound message.
    ///
    /// The solver is invoked at most once, and only for valid telemetry.
    pub fn tick(&self, raw: &str, solver: &mut dyn Solver) -> Result<TickOutcome, TickError> {
        match sim::decode(raw)? {
            SimFrame::NoData => Ok(TickOutcome::Manual),
            SimFrame::NotEvent => {
                trace!("Ignoring non-event message");
                Ok(TickOutcome::Ignored)
            },
            SimFrame::Other(event) => {
                trace!("Ignoring {:?} event", event);
                Ok(TickOutcome::Ignored)
            },
            SimFrame::Telemetry(tm) => self
                .process_telemetry(&tm, solver)
                .map(TickOutcome::Steer)
        }
    }

    /// Run a telemetry tick through to a steering command.
    pub fn process_telemetry(
        &self,
        tm: &Telemetry,
        solver: &mut dyn Solver
    ) -> Result<SteerCmd, TickError> {
        self.validate(tm)?;

        // Transform the leading waypoints into the vehicle frame
        let pose = VehiclePose::new(tm.pos_x_m, tm.pos_y_m, tm.heading_rad);
        let waypoints_m = pose.to_vehicle_frame(&zip_points(
            &tm.waypoints_x_m[..self.params.fit_point_count],
            &tm.waypoints_y_m[..self.params.fit_point_count]
        ));

        let xs: Vec<f64> = waypoints_m.iter().map(|p| p[0]).collect();
        let ys: Vec<f64> = waypoints_m.iter().map(|p| p[1]).collect();

        // Fit the reference path and get the errors at the vehicle
        let coeffs = polyfit(&xs, &ys, self.params.fit_order)?;
        let cte_m = coeffs.cte_at_origin();
        let epsi_rad = coeffs.heading_error_at_origin();

        debug!(
            "Reference path {:?}, cte {:.4} m, epsi {:.4} rad",
            coeffs.as_slice(), cte_m, epsi_rad
        );

        // Compensate for the latency
        let state = self.projector.project(
            &ControlState::at_origin(tm.speed, cte_m, epsi_rad),
            tm.steering_ratio,
            tm.throttle
        );

        trace!("Projected state {:?}", state);

        let result = SolverResult::from_flat(
            &solver.solve(&state, &coeffs)?,
            self.params.horizon_len
        )?;

        Ok(self.steer_cmd(result, &coeffs))
    }

    fn validate(&self, tm: &Telemetry) -> Result<(), ValidationError> {
        let num_points = tm.num_waypoints().ok_or(ValidationError::LengthMismatch {
            x: tm.waypoints_x_m.len(),
            y: tm.waypoints_y_m.len()
        })?;

        if num_points < self.params.fit_point_count {
            return Err(ValidationError::InsufficientPoints {
                found: num_points,
                required: self.params.fit_point_count
            })
        }

        if !tm.is_finite() {
            return Err(ValidationError::NonFinite)
        }

        Ok(())
    }

    /// Build the outbound command from the solver's result.
    ///
    /// The simulator expects a normalised steering value where positive steers right, while the
    /// solver works in radians with positive steering left.
    fn steer_cmd(&self, result: SolverResult, coeffs: &PolyCoeffs) -> SteerCmd {
        let (next_x, next_y) = self.reference_path(coeffs);

        SteerCmd {
            steering_angle: -result.steering_rad / self.params.max_steer_rad(),
            throttle: result.throttle,
            mpc_x: result.predicted_x_m,
            mpc_y: result.predicted_y_m,
            next_x,
            next_y,
        }
    }

    /// Sample the reference path ahead of the vehicle for display.
    pub fn reference_path(&self, coeffs: &PolyCoeffs) -> (Vec<f64>, Vec<f64>) {
        (0..self.params.ref_point_count)
            .map(|i| {
                let x = self.params.ref_point_spacing_m * (i + 1) as f64;
                (x, coeffs.eval(x))
            })
            .unzip()
    }
}

impl TickOutcome {
    /// Encode the response frame, if there is one.
    pub fn encode(&self) -> Result<Option<String>, FrameError> {
        match self {
            TickOutcome::Ignored => Ok(None),
            TickOutcome::Manual => Ok(Some(sim::encode_manual())),
            TickOutcome::Steer(cmd) => sim::encode_steer(cmd).map(Some)
        }
    }
}
