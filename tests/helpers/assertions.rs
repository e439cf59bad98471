//! Tolerance checks for filter outputs
//!
//! [`assert_close`] compares scalars, vectors and matrices through the
//! [`Entries`] view. [`assert_valid_covariance`] checks the invariants a
//! covariance must keep through every predict and update.

use nalgebra::{DMatrix, DVector};

use fading_kalman::linalg::{is_symmetric, min_eigenvalue};

/// Column-major view over a numeric value
pub trait Entries {
    /// (rows, cols)
    fn dims(&self) -> (usize, usize);
    /// Entry at (row, col)
    fn entry(&self, row: usize, col: usize) -> f64;
}

impl Entries for f64 {
    fn dims(&self) -> (usize, usize) {
        (1, 1)
    }

    fn entry(&self, _row: usize, _col: usize) -> f64 {
        *self
    }
}

impl Entries for DVector<f64> {
    fn dims(&self) -> (usize, usize) {
        (self.len(), 1)
    }

    fn entry(&self, row: usize, _col: usize) -> f64 {
        self[row]
    }
}

impl Entries for DMatrix<f64> {
    fn dims(&self) -> (usize, usize) {
        self.shape()
    }

    fn entry(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }
}

/// Assert every entry of `actual` is within `tolerance` of `expected`.
///
/// A tolerance of `0.0` demands bitwise-equal values.
pub fn assert_close<T: Entries + ?Sized>(actual: &T, expected: &T, tolerance: f64, name: &str) {
    let dims = actual.dims();
    assert_eq!(
        dims,
        expected.dims(),
        "{}: shape {:?} != expected {:?}",
        name,
        dims,
        expected.dims()
    );

    for col in 0..dims.1 {
        for row in 0..dims.0 {
            let (a, e) = (actual.entry(row, col), expected.entry(row, col));
            assert!(
                (a - e).abs() <= tolerance,
                "{}[{},{}]: {} vs expected {} (tolerance {})",
                name,
                row,
                col,
                a,
                e,
                tolerance
            );
        }
    }
}

/// Assert a covariance is symmetric and positive semi-definite.
///
/// Tolerances scale with the largest entry so that large covariances are
/// held to the same relative precision as small ones.
pub fn assert_valid_covariance(p: &DMatrix<f64>, name: &str) {
    let scale = p.abs().max().max(1.0);
    assert!(
        is_symmetric(p, 1e-10 * scale),
        "{}: not symmetric\n{}",
        name,
        p
    );
    let min_eig = min_eigenvalue(p);
    assert!(
        min_eig >= -1e-9 * scale,
        "{}: negative eigenvalue {}\n{}",
        name,
        min_eig,
        p
    );
}
