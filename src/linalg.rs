//! Linear algebra utilities
//!
//! Shape-checked matrix arithmetic used by the filter recursion, plus the
//! Gaussian and covariance-health helpers used for diagnostics.
//!
//! nalgebra panics when dynamically sized operands disagree. The helpers
//! here check shapes first and return [`FilterError::ShapeMismatch`] so the
//! caller receives an error instead of an abort.

use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

use crate::filter::FilterError;

/// Check that a matrix has the expected shape
///
/// # Arguments
/// * `m` - Matrix to check
/// * `expected` - Expected (rows, cols)
/// * `context` - Name used in the error message
pub fn expect_shape(
    m: &DMatrix<f64>,
    expected: (usize, usize),
    context: &str,
) -> Result<(), FilterError> {
    if m.shape() != expected {
        return Err(FilterError::shape(context, expected, m.shape()));
    }
    Ok(())
}

/// Check that a vector has the expected length
pub fn expect_len(v: &DVector<f64>, expected: usize, context: &str) -> Result<(), FilterError> {
    if v.len() != expected {
        return Err(FilterError::shape(context, (expected, 1), (v.len(), 1)));
    }
    Ok(())
}

/// Matrix product `a · b`
pub fn mul(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    context: &str,
) -> Result<DMatrix<f64>, FilterError> {
    if a.ncols() != b.nrows() {
        return Err(FilterError::shape(
            context,
            (a.ncols(), b.ncols()),
            b.shape(),
        ));
    }
    Ok(a * b)
}

/// Matrix-vector product `a · v`
pub fn mul_vec(
    a: &DMatrix<f64>,
    v: &DVector<f64>,
    context: &str,
) -> Result<DVector<f64>, FilterError> {
    if a.ncols() != v.len() {
        return Err(FilterError::shape(context, (a.ncols(), 1), (v.len(), 1)));
    }
    Ok(a * v)
}

/// Triple product `a · b · cᵀ`
///
/// The shape used throughout the recursion: `F·P·Fᵀ`, `H·P·Hᵀ`,
/// `(I−KH)·P·(I−KH)ᵀ` and `K·R·Kᵀ`.
pub fn sandwich(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    c: &DMatrix<f64>,
    context: &str,
) -> Result<DMatrix<f64>, FilterError> {
    let ab = mul(a, b, context)?;
    mul(&ab, &c.transpose(), context)
}

/// Elementwise sum `a + b`
pub fn add(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    context: &str,
) -> Result<DMatrix<f64>, FilterError> {
    expect_shape(b, a.shape(), context)?;
    Ok(a + b)
}

/// Vector sum `a + b`
pub fn add_vec(
    a: &DVector<f64>,
    b: &DVector<f64>,
    context: &str,
) -> Result<DVector<f64>, FilterError> {
    expect_len(b, a.len(), context)?;
    Ok(a + b)
}

/// Vector difference `a − b`
pub fn sub_vec(
    a: &DVector<f64>,
    b: &DVector<f64>,
    context: &str,
) -> Result<DVector<f64>, FilterError> {
    expect_len(b, a.len(), context)?;
    Ok(a - b)
}

/// Kalman gain `K = P·Hᵀ·S⁻¹` without forming `S⁻¹`
///
/// Solves `S·Kᵀ = (P·Hᵀ)ᵀ` with a Cholesky factorisation of `S`, falling
/// back to LU when `S` is not numerically positive definite. Singularity
/// is decided by the factorisation, so the result does not depend on the
/// magnitude of `det(S)`.
///
/// # Arguments
/// * `pht` - Cross covariance `P·Hᵀ` (dim_x × dim_z)
/// * `s` - Innovation covariance (dim_z × dim_z)
/// * `context` - Name used in the error message
///
/// # Returns
/// The gain, or [`FilterError::SingularMatrix`] if `S` cannot be factorised
pub fn kalman_gain(
    pht: &DMatrix<f64>,
    s: &DMatrix<f64>,
    context: &str,
) -> Result<DMatrix<f64>, FilterError> {
    let n = s.nrows();
    expect_shape(s, (n, n), context)?;
    if pht.ncols() != n {
        return Err(FilterError::shape(context, (pht.nrows(), n), pht.shape()));
    }

    let rhs = pht.transpose();
    let kt = match s.clone().cholesky() {
        Some(chol) => Some(chol.solve(&rhs)),
        None => s.clone().lu().solve(&rhs),
    };

    match kt {
        Some(kt) if kt.iter().all(|v| v.is_finite()) => Ok(kt.transpose()),
        _ => Err(FilterError::SingularMatrix {
            context: context.to_string(),
        }),
    }
}

/// Compute log Gaussian PDF of a zero-mean residual
///
/// # Arguments
/// * `y` - Residual (innovation)
/// * `s` - Residual covariance
///
/// # Returns
/// `log N(y; 0, s)`, or negative infinity when `s` is not positive definite
pub fn log_gaussian_pdf(y: &DVector<f64>, s: &DMatrix<f64>) -> f64 {
    let n = y.len() as f64;

    match s.clone().cholesky() {
        Some(chol) => {
            // log det(S) = 2·Σ ln Lᵢᵢ
            let log_det: f64 = 2.0
                * chol
                    .l_dirty()
                    .diagonal()
                    .iter()
                    .map(|d| d.ln())
                    .sum::<f64>();
            let mahalanobis = y.dot(&chol.solve(y));
            -0.5 * (n * (2.0 * PI).ln() + log_det + mahalanobis)
        }
        None => f64::NEG_INFINITY,
    }
}

/// Compute Mahalanobis distance of a zero-mean residual
///
/// # Returns
/// `sqrt(yᵀ s⁻¹ y)`, infinite when `s` is singular
pub fn mahalanobis_distance(y: &DVector<f64>, s: &DMatrix<f64>) -> f64 {
    match s.clone().cholesky() {
        Some(chol) => y.dot(&chol.solve(y)).sqrt(),
        None => f64::INFINITY,
    }
}

/// Check symmetry within an absolute tolerance
pub fn is_symmetric(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    matrix.is_square()
        && matrix
            .iter()
            .zip(matrix.transpose().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
}

/// Make matrix symmetric
///
/// Averages the matrix with its transpose.
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (matrix + matrix.transpose())
}

/// Smallest eigenvalue of the symmetric part of a square matrix
pub fn min_eigenvalue(matrix: &DMatrix<f64>) -> f64 {
    symmetrize(matrix)
        .symmetric_eigenvalues()
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
}

/// Check positive semi-definiteness
///
/// # Arguments
/// * `matrix` - Square matrix to check
/// * `tolerance` - Eigenvalues down to `-tolerance` are accepted
pub fn is_positive_semidefinite(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    matrix.is_square() && min_eigenvalue(matrix) >= -tolerance
}
