//! # Telemetry payload
//!
//! The vehicle state streamed by the simulator on every tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Payload of a `telemetry` event.
///
/// All positions are in the simulator's world frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// X coordinates of the upcoming waypoints, paired by index with `waypoints_y_m`.
    #[serde(rename = "ptsx")]
    pub waypoints_x_m: Vec<f64>,

    /// Y coordinates of the upcoming waypoints, paired by index with `waypoints_x_m`.
    #[serde(rename = "ptsy")]
    pub waypoints_y_m: Vec<f64>,

    /// Vehicle X position
    #[serde(rename = "x")]
    pub pos_x_m: f64,

    /// Vehicle Y position
    #[serde(rename = "y")]
    pub pos_y_m: f64,

    /// Vehicle heading, angle to the world X axis.
    ///
    /// Units: radians
    #[serde(rename = "psi")]
    pub heading_rad: f64,

    /// Magnitude of the vehicle velocity.
    pub speed: f64,

    /// Steering currently applied, as a ratio of the maximum steering angle in the simulator's
    /// convention (positive is a right turn).
    ///
    /// Units: conceptually between -1 and +1
    #[serde(rename = "steering_angle")]
    pub steering_ratio: f64,

    /// Throttle currently applied.
    ///
    /// Units: between -1 and +1
    pub throttle: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Telemetry {
    /// Number of waypoint pairs in the payload, or `None` if the X and Y sequences differ in
    /// length.
    pub fn num_waypoints(&self) -> Option<usize> {
        match self.waypoints_x_m.len() == self.waypoints_y_m.len() {
            true => Some(self.waypoints_x_m.len()),
            false => None
        }
    }

    /// True if every scalar in the payload is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.pos_x_m,
            self.pos_y_m,
            self.heading_rad,
            self.speed,
            self.steering_ratio,
            self.throttle
        ].iter()
            .chain(self.waypoints_x_m.iter())
            .chain(self.waypoints_y_m.iter())
            .all(|v| v.is_finite())
    }
}
