//! # Frame transform
//!
//! Converts points from the simulator's world frame into the vehicle frame.
//!
//! The vehicle frame has its origin at the vehicle's position, the X axis along the vehicle's
//! heading and the Y axis to the vehicle's left (right hand rule about Z, pointing up).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose of the vehicle in the world frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VehiclePose {
    /// Position in the world frame
    pub position_m: Vector2<f64>,

    /// Heading, the angle from the world X axis to the vehicle X axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehiclePose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad,
        }
    }

    /// Transform a single world frame point into the vehicle frame.
    ///
    /// The point is translated so the vehicle sits at the origin, then rotated by the negated
    /// heading (the world to body rotation):
    ///
    /// ```text
    /// bx =  dx*cos(psi) + dy*sin(psi)
    /// by = -dx*sin(psi) + dy*cos(psi)
    /// ```
    pub fn point_to_vehicle_frame(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        Rotation2::new(-self.heading_rad) * (point_m - self.position_m)
    }

    /// Transform a sequence of world frame points into the vehicle frame, preserving order.
    pub fn to_vehicle_frame(&self, points_m: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
        let rot = Rotation2::new(-self.heading_rad);

        points_m
            .iter()
            .map(|p| rot * (p - self.position_m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Zip paired X and Y sequences into points. Extra elements in the longer sequence are dropped.
pub fn zip_points(xs: &[f64], ys: &[f64]) -> Vec<Vector2<f64>> {
    xs.iter()
        .zip(ys.iter())
        .map(|(x, y)| Vector2::new(*x, *y))
        .collect()
}
