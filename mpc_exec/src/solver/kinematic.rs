//! # Kinematic solver
//!
//! A simple stand-in for a trajectory optimiser. Proportional controllers on the cross track and
//! heading errors give the steering demand, and one on the speed error gives the throttle. The
//! kinematic bicycle model is rolled forward over the horizon with these controllers in the loop to
//! produce the predicted trajectory.
//!
//! The steering output is in the model convention, positive turns left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::{clamp, PolyCoeffs};

use super::{ControlState, Solver, SolverError, SolverParams};
use crate::pipeline::PipelineParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KinematicSolver {
    params: SolverParams,

    /// Number of steps in the horizon
    horizon_len: usize,

    /// Distance between the front axle and the centre of gravity
    wheelbase_m: f64,

    /// Steering limit, the demand is clamped to +/- this value
    max_steer_rad: f64,
}

/// Actuation demands for a single step.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Actuation {
    steering_rad: f64,
    throttle: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinematicSolver {
    /// Create a new solver. The horizon and vehicle geometry are taken from the pipeline
    /// parameters so the output always matches what the pipeline expects.
    pub fn new(params: SolverParams, pipeline: &PipelineParams) -> Self {
        Self {
            params,
            horizon_len: pipeline.horizon_len,
            wheelbase_m: pipeline.wheelbase_m,
            max_steer_rad: pipeline.max_steer_rad(),
        }
    }

    /// Compute the demands for the given state.
    fn actuation(&self, state: &ControlState) -> Actuation {
        // A path to the left (positive cte) needs a left turn, while a heading already to the left
        // of the path (positive epsi) needs a right turn.
        let steering_rad = self.params.cte_k_p * state.cte_m
            - self.params.epsi_k_p * state.epsi_rad;

        let throttle = self.params.speed_k_p * (self.params.ref_speed - state.v);

        Actuation {
            steering_rad: clamp(&steering_rad, &-self.max_steer_rad, &self.max_steer_rad),
            throttle: clamp(&throttle, &-1.0, &1.0),
        }
    }

    /// Advance the state by one time step, recomputing the errors against the reference path.
    fn step(
        &self,
        state: &ControlState,
        act: &Actuation,
        coeffs: &PolyCoeffs,
        slope: &PolyCoeffs
    ) -> ControlState {
        let dt = self.params.dt_s;

        let x_m = state.x_m + state.v * state.psi_rad.cos() * dt;
        let y_m = state.y_m + state.v * state.psi_rad.sin() * dt;
        let psi_rad = state.psi_rad + state.v * act.steering_rad * dt / self.wheelbase_m;
        let v = state.v + act.throttle * dt;

        ControlState {
            x_m,
            y_m,
            psi_rad,
            v,
            cte_m: coeffs.eval(x_m) - y_m,
            epsi_rad: psi_rad - slope.eval(x_m).atan(),
        }
    }
}

impl Solver for KinematicSolver {
    fn solve(
        &mut self,
        state: &ControlState,
        coeffs: &PolyCoeffs
    ) -> Result<Vec<f64>, SolverError> {
        let slope = coeffs.derivative();

        let first = self.actuation(state);

        let mut xs = Vec::with_capacity(self.horizon_len);
        let mut ys = Vec::with_capacity(self.horizon_len);

        let mut current = *state;
        let mut act = first;

        for _ in 0..self.horizon_len {
            current = self.step(&current, &act, coeffs, &slope);

            if !current.to_array().iter().all(|v| v.is_finite()) {
                return Err(SolverError::NotConverged(format!(
                    "predicted state diverged: {:?}", current
                )))
            }

            xs.push(current.x_m);
            ys.push(current.y_m);

            act = self.actuation(&current);
        }

        trace!(
            "Kinematic solution: steering {:.4} rad, throttle {:.3}, final state {:?}",
            first.steering_rad, first.throttle, current
        );

        let mut values = Vec::with_capacity(2 + 2 * self.horizon_len);
        values.push(first.steering_rad);
        values.push(first.throttle);
        values.append(&mut xs);
        values.append(&mut ys);

        Ok(values)
    }
}
