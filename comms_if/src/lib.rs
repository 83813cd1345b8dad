//! # Communications interface crate.
//!
//! Provides the communications interfaces shared between the bridge and the simulator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulator event protocol, framing and payload definitions
pub mod sim;
