//! # Solver boundary
//!
//! The trajectory optimiser is an external collaborator. This module defines the contract the
//! pipeline expects of it:
//!
//! - Input: the latency compensated [`ControlState`] and the reference path polynomial.
//! - Output: a flat vector `[steering, throttle, x_0 .. x_N-1, y_0 .. y_N-1]` where `N` is the
//!   horizon length. Steering is in radians in the model convention (positive turns left).
//!
//! The flat output is converted into a [`SolverResult`] exactly once, in
//! [`SolverResult::from_flat`], so the positional layout is only known here.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod kinematic;
mod params;

pub use kinematic::KinematicSolver;
pub use params::SolverParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::PolyCoeffs;

pub use crate::latency::ControlState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Index of the steering actuation in the flat solver output.
const STEERING_INDEX: usize = 0;

/// Index of the throttle actuation in the flat solver output.
const THROTTLE_INDEX: usize = 1;

/// Index of the first predicted X coordinate in the flat solver output.
const PATH_START_INDEX: usize = 2;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trajectory solver.
///
/// Solvers are confined to a single connection's thread, so they may keep internal state (for
/// instance to warm start) without synchronisation.
pub trait Solver: Send {
    /// Solve for the given state and reference path, returning the flat output vector.
    fn solve(&mut self, state: &ControlState, coeffs: &PolyCoeffs) -> Result<Vec<f64>, SolverError>;
}

/// Creates a solver for each new connection.
pub trait SolverFactory: Send + Sync {
    fn create(&self) -> Box<dyn Solver>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The tagged output of a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    /// First steering actuation, in the model convention (positive turns left).
    ///
    /// Units: radians
    pub steering_rad: f64,

    /// First throttle actuation.
    ///
    /// Units: between -1 and +1
    pub throttle: f64,

    /// X coordinates of the predicted trajectory in the vehicle frame.
    pub predicted_x_m: Vec<f64>,

    /// Y coordinates of the predicted trajectory in the vehicle frame.
    pub predicted_y_m: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can be raised by a solver, or while interpreting its output.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("The solver did not converge: {0}")]
    NotConverged(String),

    #[error("Expected the solver to output {expected} values, found {found}")]
    MalformedOutput {
        expected: usize,
        found: usize
    },

    #[error("The solver output contains a non-finite value at index {0}")]
    NonFiniteOutput(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SolverResult {
    /// Number of values a solver with the given horizon must output.
    pub fn flat_len(horizon_len: usize) -> usize {
        PATH_START_INDEX + 2 * horizon_len
    }

    /// Interpret a flat solver output with the given horizon length.
    ///
    /// Any values beyond the expected layout are ignored.
    pub fn from_flat(values: &[f64], horizon_len: usize) -> Result<Self, SolverError> {
        let expected = Self::flat_len(horizon_len);

        if values.len() < expected {
            return Err(SolverError::MalformedOutput {
                expected,
                found: values.len()
            })
        }

        if let Some(i) = values[..expected].iter().position(|v| !v.is_finite()) {
            return Err(SolverError::NonFiniteOutput(i))
        }

        let y_start = PATH_START_INDEX + horizon_len;

        Ok(Self {
            steering_rad: values[STEERING_INDEX],
            throttle: values[THROTTLE_INDEX],
            predicted_x_m: values[PATH_START_INDEX..y_start].to_vec(),
            predicted_y_m: values[y_start..expected].to_vec(),
        })
    }

    /// Build the flat representation of this result.
    pub fn to_flat(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(
            PATH_START_INDEX + self.predicted_x_m.len() + self.predicted_y_m.len()
        );

        values.push(self.steering_rad);
        values.push(self.throttle);
        values.extend_from_slice(&self.predicted_x_m);
        values.extend_from_slice(&self.predicted_y_m);

        values
    }
}

impl<F> SolverFactory for F
where
    F: Fn() -> Box<dyn Solver> + Send + Sync
{
    fn create(&self) -> Box<dyn Solver> {
        self()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::PipelineParams;

    #[test]
    fn test_from_flat_layout() {
        let values = vec![0.1, 0.5, 1.0, 2.0, 3.0, -1.0, -2.0, -3.0];

        let result = SolverResult::from_flat(&values, 3).unwrap();

        assert_eq!(result.steering_rad, 0.1);
        assert_eq!(result.throttle, 0.5);
        assert_eq!(result.predicted_x_m, vec![1.0, 2.0, 3.0]);
        assert_eq!(result.predicted_y_m, vec![-1.0, -2.0, -3.0]);
        assert_eq!(result.to_flat(), values);
    }

    #[test]
    fn test_from_flat_rejects_short_output() {
        let values = vec![0.1, 0.5, 1.0, 2.0, 3.0, -1.0, -2.0];

        match SolverResult::from_flat(&values, 3) {
            Err(SolverError::MalformedOutput { expected, found }) => {
                assert_eq!(expected, 8);
                assert_eq!(found, 7);
            },
            r => panic!("Expected a malformed output error, got {:?}", r)
        }
    }

    #[test]
    fn test_from_flat_rejects_non_finite() {
        let values = vec![0.1, 0.5, 1.0, std::f64::NAN];

        assert!(matches!(
            SolverResult::from_flat(&values, 1),
            Err(SolverError::NonFiniteOutput(3))
        ));
    }

    #[test]
    fn test_factory_closure() {
        let factory = || -> Box<dyn Solver> {
            Box::new(KinematicSolver::new(SolverParams::default(), &PipelineParams::default()))
        };

        let mut solver = SolverFactory::create(&factory);
        let out = solver
            .solve(&ControlState::default(), &PolyCoeffs(vec![0.0, 0.0, 0.0, 0.0]))
            .unwrap();

        assert_eq!(out.len(), SolverResult::flat_len(PipelineParams::default().horizon_len));
    }
}
