//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
///
/// The root must contain the `params` directory, and is where the `sessions`
/// directory is created.
pub const SW_ROOT_ENV_VAR: &str = "MPC_BRIDGE_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Retrieve a short description of the host this executable runs on.
pub fn get_host_info() -> String {
    format!(
        "{} ({}), {} cpus",
        env::consts::OS,
        env::consts::ARCH,
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    )
}
