//! Parameters structure for the control pipeline

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use util::maths::deg_to_rad;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineParams {

    // ---- VEHICLE ----

    /// Distance between the front axle and the centre of gravity of the vehicle.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Maximum steering angle of the vehicle, used to normalise the steering demand.
    ///
    /// Units: degrees
    pub max_steer_deg: f64,

    // ---- LATENCY ----

    /// Time the measured state is projected forward by before solving.
    ///
    /// Units: seconds
    pub latency_s: f64,

    // ---- FITTING ----

    /// Number of leading waypoints used to fit the reference path. Telemetry with fewer waypoints
    /// than this is rejected.
    pub fit_point_count: usize,

    /// Order of the reference path polynomial.
    pub fit_order: usize,

    // ---- OUTPUT ----

    /// Number of points in the reference path reported back to the simulator.
    pub ref_point_count: usize,

    /// Spacing along the vehicle X axis of the reported reference path points.
    ///
    /// Units: meters
    pub ref_point_spacing_m: f64,

    /// Number of steps in the solver's prediction horizon.
    pub horizon_len: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PipelineParams {
    /// Maximum steering angle in radians.
    pub fn max_steer_rad(&self) -> f64 {
        deg_to_rad(self.max_steer_deg)
    }
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            wheelbase_m: 2.67,
            max_steer_deg: 25.0,
            latency_s: 0.1,
            fit_point_count: 6,
            fit_order: 3,
            ref_point_count: 30,
            ref_point_spacing_m: 2.0,
            horizon_len: 20,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params_match_default() {
        let shipped: PipelineParams = util::params::load_from_path(
            concat!(env!("CARGO_MANIFEST_DIR"), "/../params/pipeline.toml")
        ).unwrap();

        assert_eq!(shipped, PipelineParams::default());
    }
}
