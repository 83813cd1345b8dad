//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};
use num_traits::Float;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Diagonal elements of the QR `R` factor smaller than this fraction of the design matrix's norm
/// mark it as rank deficient.
const RANK_TOLERANCE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Coefficients of a polynomial, lowest power first.
///
/// `coeffs[i]` is the coefficient of `x^i`, so the polynomial is
/// `coeffs[0] + coeffs[1]*x + coeffs[2]*x^2 + ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyCoeffs(pub Vec<f64>);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while fitting a polynomial.
#[derive(Debug, Error, PartialEq)]
pub enum PolyFitError {
    #[error("Expected the same number of x and y values, found {0} x and {1} y")]
    LengthMismatch(usize, usize),

    #[error("Cannot fit a polynomial of order {order} to {num_points} points")]
    InvalidOrder {
        order: usize,
        num_points: usize
    },

    #[error("The points do not define a unique polynomial (repeated or non-finite x values)")]
    Degenerate
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PolyCoeffs {
    /// Evaluate the polynomial at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        polyeval(&self.0, x)
    }

    /// Order of the polynomial (number of coefficients minus one).
    pub fn order(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Cross track error at the origin, i.e. the value of the polynomial at `x = 0`.
    pub fn cte_at_origin(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Heading error at the origin.
    ///
    /// This is the negated angle of the polynomial's tangent at `x = 0`, since the heading of the
    /// vehicle frame is zero at the vehicle itself.
    pub fn heading_error_at_origin(&self) -> f64 {
        -self.0.get(1).copied().unwrap_or(0.0).atan()
    }

    /// The derivative of the polynomial.
    pub fn derivative(&self) -> PolyCoeffs {
        PolyCoeffs(
            self.0
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| i as f64 * c)
                .collect()
        )
    }

    /// View the coefficients as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Convert an angle in degrees into radians.
pub fn deg_to_rad<T>(deg: T) -> T
where
    T: Float
{
    deg.to_radians()
}

/// Evaluate a polynomial whose coefficients are given lowest power first.
///
/// Uses Horner's method. An empty coefficient slice evaluates to zero.
pub fn polyeval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Fit a polynomial of the given order to the points `(xs[i], ys[i])` by least squares.
///
/// The Vandermonde design matrix (column `j` is `xs^j`) is decomposed with a Householder QR and
/// the system `R c = Q^T y` solved by back substitution, which is better conditioned than forming
/// the normal equations.
///
/// # Errors
/// - `LengthMismatch` if `xs` and `ys` are of different lengths.
/// - `InvalidOrder` unless `1 <= order <= xs.len() - 1`.
/// - `Degenerate` if the design matrix is rank deficient or the solution is not finite.
pub fn polyfit(xs: &[f64], ys: &[f64], order: usize) -> Result<PolyCoeffs, PolyFitError> {
    if xs.len() != ys.len() {
        return Err(PolyFitError::LengthMismatch(xs.len(), ys.len()))
    }

    if order < 1 || order + 1 > xs.len() {
        return Err(PolyFitError::InvalidOrder {
            order,
            num_points: xs.len()
        })
    }

    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(PolyFitError::Degenerate)
    }

    // Build the design matrix, each row is [1, x, x^2, ..., x^order]
    let design = DMatrix::from_fn(xs.len(), order + 1, |row, col| xs[row].powi(col as i32));
    let rhs = DVector::from_column_slice(ys);

    let scale = design.norm();

    let qr = design.qr();
    let q = qr.q();
    let r = qr.r();

    // Reject rank deficient designs, the back substitution would otherwise happily divide by a
    // value that is only non-zero through rounding.
    if scale == 0.0
        || r.diagonal().iter().any(|d| d.abs() <= RANK_TOLERANCE * scale)
    {
        return Err(PolyFitError::Degenerate)
    }

    let coeffs = r
        .solve_upper_triangular(&(q.transpose() * rhs))
        .ok_or(PolyFitError::Degenerate)?;

    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(PolyFitError::Degenerate)
    }

    Ok(PolyCoeffs(coeffs.iter().copied().collect()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} != {} (tol {})", a, b, tol);
    }

    #[test]
    fn test_polyeval() {
        assert_eq!(polyeval(&[], 3.0), 0.0);
        assert_eq!(polyeval(&[2.0], 3.0), 2.0);
        // 1 + 2x + 3x^2 at x = 2
        assert_eq!(polyeval(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_eq!(polyeval(&[1.0, 2.0, 3.0], 0.0), 1.0);
    }

    #[test]
    fn test_polyfit_exact_interpolation() {
        let xs = [0.0, 1.5, 3.0, 4.0];
        let ys = [1.0, -2.0, 0.5, 7.0];

        let coeffs = polyfit(&xs, &ys, 3).unwrap();
        assert_eq!(coeffs.order(), 3);

        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_close(coeffs.eval(*x), *y, 1e-6);
        }
    }

    #[test]
    fn test_polyfit_recovers_cubic() {
        // y = 0.5 - 0.25x + 0.01x^2 + 0.002x^3, oversampled so this is a real least squares
        let truth = [0.5, -0.25, 0.01, 0.002];
        let xs: Vec<f64> = (0..8).map(|i| -10.0 + 4.0 * i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| polyeval(&truth, *x)).collect();

        let coeffs = polyfit(&xs, &ys, 3).unwrap();

        for (c, t) in coeffs.as_slice().iter().zip(truth.iter()) {
            assert_close(*c, *t, 1e-9 * t.abs().max(1.0));
        }
    }

    #[test]
    fn test_polyfit_linear_recovery() {
        let xs = [2.0, 5.0, 11.0, 17.0, 23.0, 40.0];

        for k in [-3.0, 0.0, 0.5, 12.0].iter() {
            let ys: Vec<f64> = xs.iter().map(|x| k * x).collect();
            let coeffs = polyfit(&xs, &ys, 1).unwrap();

            for x in [-4.0, 0.0, 7.5, 100.0].iter() {
                assert_close(coeffs.eval(*x), k * x, 1e-9 * (k * x).abs().max(1.0));
            }
        }
    }

    #[test]
    fn test_polyfit_least_squares_line() {
        // Symmetric noise about y = x, the best fit line is y = x
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.1, 0.9, 2.1, 2.9];

        let coeffs = polyfit(&xs, &ys, 1).unwrap();
        assert_close(coeffs.0[1], 0.96, 1e-9);
        assert_close(coeffs.0[0], 0.06, 1e-9);
    }

    #[test]
    fn test_polyfit_preconditions() {
        assert_eq!(
            polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0], 1),
            Err(PolyFitError::LengthMismatch(3, 2))
        );
        assert_eq!(
            polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 0),
            Err(PolyFitError::InvalidOrder { order: 0, num_points: 3 })
        );
        assert_eq!(
            polyfit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 3),
            Err(PolyFitError::InvalidOrder { order: 3, num_points: 3 })
        );
    }

    #[test]
    fn test_polyfit_degenerate() {
        // All x values equal, no unique line exists
        assert_eq!(
            polyfit(&[2.0, 2.0, 2.0, 2.0], &[1.0, 2.0, 3.0, 4.0], 1),
            Err(PolyFitError::Degenerate)
        );
        assert_eq!(
            polyfit(&[0.0, 1.0, std::f64::NAN], &[0.0, 1.0, 2.0], 1),
            Err(PolyFitError::Degenerate)
        );
    }

    #[test]
    fn test_derived_errors() {
        let coeffs = PolyCoeffs(vec![1.5, 1.0, 0.0, 0.0]);
        assert_eq!(coeffs.cte_at_origin(), 1.5);
        assert_close(coeffs.heading_error_at_origin(), -std::f64::consts::FRAC_PI_4, 1e-12);
    }

    #[test]
    fn test_derivative() {
        // d/dx (1 + 2x + 3x^2 + 4x^3) = 2 + 6x + 12x^2
        let coeffs = PolyCoeffs(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(coeffs.derivative(), PolyCoeffs(vec![2.0, 6.0, 12.0]));
        assert_eq!(PolyCoeffs(vec![5.0]).derivative(), PolyCoeffs(vec![]));
        assert_eq!(PolyCoeffs(vec![5.0]).derivative().eval(3.0), 0.0);
    }

    #[test]
    fn test_clamp_and_deg_to_rad() {
        assert_eq!(clamp(&3f64, &-1f64, &1f64), 1f64);
        assert_eq!(clamp(&-3f64, &-1f64, &1f64), -1f64);
        assert_eq!(clamp(&0.25f64, &-1f64, &1f64), 0.25f64);
        assert_close(deg_to_rad(25f64), 0.436_332_312_998_582_4, 1e-15);
    }
}
