//! # Latency projection
//!
//! The first actuation computed by the solver only takes effect some time after the telemetry it
//! was computed from was sampled. To account for this the measured state is projected forward by
//! that latency with a kinematic bicycle model before it is handed to the solver.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of elements in the flattened state vector.
pub const STATE_LEN: usize = 6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State of the vehicle in the vehicle frame, as consumed by the solver.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct ControlState {
    /// Position along the vehicle X axis
    pub x_m: f64,

    /// Position along the vehicle Y axis
    pub y_m: f64,

    /// Heading relative to the vehicle X axis
    ///
    /// Units: radians
    pub psi_rad: f64,

    /// Velocity
    pub v: f64,

    /// Cross track error, the lateral offset of the reference path from the vehicle
    pub cte_m: f64,

    /// Heading error between the vehicle and the reference path tangent
    ///
    /// Units: radians
    pub epsi_rad: f64,
}

/// Projects a measured state forward by a fixed actuation latency.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatencyProjector {
    /// Time between the telemetry being sampled and the actuation taking effect.
    ///
    /// Units: seconds
    pub latency_s: f64,

    /// Distance between the front axle and the centre of gravity.
    ///
    /// Units: meters
    pub wheelbase_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlState {
    /// The state at the instant of measurement.
    ///
    /// The vehicle frame is redefined on every tick, so the vehicle's own position and heading are
    /// always zero at that instant.
    pub fn at_origin(v: f64, cte_m: f64, epsi_rad: f64) -> Self {
        Self {
            x_m: 0.0,
            y_m: 0.0,
            psi_rad: 0.0,
            v,
            cte_m,
            epsi_rad,
        }
    }

    /// Flatten into the solver's state vector `[x, y, psi, v, cte, epsi]`.
    pub fn to_array(&self) -> [f64; STATE_LEN] {
        [self.x_m, self.y_m, self.psi_rad, self.v, self.cte_m, self.epsi_rad]
    }
}

impl LatencyProjector {
    pub fn new(latency_s: f64, wheelbase_m: f64) -> Self {
        Self {
            latency_s,
            wheelbase_m,
        }
    }

    /// Project the state forward by the latency with one explicit Euler step.
    ///
    /// `steering_ratio` and `throttle` are the actuations currently applied, as reported by the
    /// simulator. The steering ratio is in the simulator's convention (positive is a right turn)
    /// which is why it reduces the heading.
    ///
    /// From the origin state this gives:
    ///
    /// ```text
    /// x'    = v*dt
    /// y'    = 0
    /// psi'  = -v*steering_ratio*dt/Lf
    /// cte'  = cte + v*sin(epsi)*dt
    /// epsi' = epsi + psi'
    /// v'    = v + throttle*dt
    /// ```
    pub fn project(
        &self,
        state: &ControlState,
        steering_ratio: f64,
        throttle: f64
    ) -> ControlState {
        let dt = self.latency_s;
        let dpsi = -state.v * steering_ratio * dt / self.wheelbase_m;

        ControlState {
            x_m: state.x_m + state.v * state.psi_rad.cos() * dt,
            y_m: state.y_m + state.v * state.psi_rad.sin() * dt,
            psi_rad: state.psi_rad + dpsi,
            v: state.v + throttle * dt,
            cte_m: state.cte_m + state.v * state.epsi_rad.sin() * dt,
            epsi_rad: state.epsi_rad + dpsi,
        }
    }
}
