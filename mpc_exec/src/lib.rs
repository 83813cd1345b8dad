//! # MPC bridge library.
//!
//! This library allows the executables and tests in the workspace to access items defined inside
//! the bridge crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Frame transform - converts world frame waypoints into the vehicle frame
pub mod frame_transform;

/// Latency projection - projects the measured state forward by the actuation latency
pub mod latency;

/// Parameters of the bridge executable
pub mod params;

/// Control pipeline - turns one simulator message into at most one response
pub mod pipeline;

/// Simulator server - accepts simulator connections and serves the pipeline over them
pub mod sim_server;

/// Solver boundary and the kinematic stand-in solver
pub mod solver;
