//! # Steering response payloads

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Payload of the `steer` event sent back to the simulator after a telemetry tick.
///
/// All path points are in the vehicle frame (origin at the vehicle, X along its heading).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SteerCmd {
    /// Steering demand as a ratio of the maximum steering angle, in the simulator's convention
    /// (positive is a right turn).
    ///
    /// Units: between -1 and +1
    pub steering_angle: f64,

    /// Throttle demand.
    ///
    /// Units: between -1 and +1
    pub throttle: f64,

    /// X coordinates of the solver's predicted trajectory (drawn green by the simulator).
    pub mpc_x: Vec<f64>,

    /// Y coordinates of the solver's predicted trajectory.
    pub mpc_y: Vec<f64>,

    /// X coordinates of the fitted reference path (drawn yellow by the simulator).
    pub next_x: Vec<f64>,

    /// Y coordinates of the fitted reference path.
    pub next_y: Vec<f64>,
}
