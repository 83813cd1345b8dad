//! Parameters structure for the kinematic solver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the kinematic solver.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SolverParams {

    // ---- MODEL ----

    /// Time step between points of the predicted trajectory.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Speed the throttle controller tracks.
    ///
    /// Units: same as the simulator's reported speed
    pub ref_speed: f64,

    // ---- GAINS ----

    /// Proportional gain from cross track error to steering.
    ///
    /// Units: radians/meter
    pub cte_k_p: f64,

    /// Proportional gain from heading error to steering.
    pub epsi_k_p: f64,

    /// Proportional gain from speed error to throttle.
    pub speed_k_p: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            dt_s: 0.1,
            ref_speed: 40.0,
            cte_k_p: 0.05,
            epsi_k_p: 0.8,
            speed_k_p: 0.1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params_match_default() {
        let shipped: SolverParams = util::params::load_from_path(
            concat!(env!("CARGO_MANIFEST_DIR"), "/../params/solver.toml")
        ).unwrap();

        assert_eq!(shipped, SolverParams::default());
    }
}
