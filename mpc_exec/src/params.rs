//! # Bridge Executable Parameters
//!
//! This module provide parameters for the bridge executable itself, i.e. those which are not owned
//! by a processing module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;
use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MpcExecParams {

    /// Address the simulator server listens on
    pub bind_addr: String,

    /// Artificial delay applied before every steering response is sent, mimicking the time it
    /// takes for a real actuator to respond. Set to zero to disable.
    ///
    /// Units: milliseconds
    pub actuation_delay_ms: u64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MpcExecParams {
    /// The actuation delay as a duration.
    pub fn actuation_delay(&self) -> Duration {
        Duration::from_millis(self.actuation_delay_ms)
    }
}

impl Default for MpcExecParams {
    fn default() -> Self {
        Self {
            bind_addr: String::from("0.0.0.0:4567"),
            actuation_delay_ms: 100
        }
    }
}
