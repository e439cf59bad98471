//! Reference recursion and model factories for tests

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::Rng;

use fading_kalman::{FadingConfig, FadingKalmanFilter};

/// Standard Kalman prediction without fading.
pub fn textbook_predict(
    x: &DVector<f64>,
    p: &DMatrix<f64>,
    f: &DMatrix<f64>,
    q: &DMatrix<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    (f * x, f * p * f.transpose() + q)
}

/// Standard Kalman update in the short `(I − K·H)·P` form.
///
/// Returns the posterior mean, covariance and gain.
pub fn textbook_update(
    x: &DVector<f64>,
    p: &DMatrix<f64>,
    h: &DMatrix<f64>,
    r: &DMatrix<f64>,
    z: &DVector<f64>,
) -> (DVector<f64>, DMatrix<f64>, DMatrix<f64>) {
    let s = h * p * h.transpose() + r;
    let k = p * h.transpose() * s.try_inverse().expect("S invertible");
    let x_new = x + &k * (z - h * x);
    let n = x.len();
    let p_new = (DMatrix::identity(n, n) - &k * h) * p;
    (x_new, p_new, k)
}

/// Constant velocity model in 2D, state [x, y, vx, vy], position measured.
pub fn constant_velocity_2d(alpha: f64, dt: f64, q: f64, r: f64) -> FadingConfig {
    #[rustfmt::skip]
    let f = DMatrix::from_row_slice(4, 4, &[
        1.0, 0.0, dt,  0.0,
        0.0, 1.0, 0.0, dt,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);
    #[rustfmt::skip]
    let h = DMatrix::from_row_slice(2, 4, &[
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
    ]);

    FadingConfig::builder()
        .alpha(alpha)
        .dimensions(4, 2, 0)
        .transition(f)
        .observation(h)
        .process_noise(DMatrix::identity(4, 4) * q)
        .measurement_noise(DMatrix::identity(2, 2) * r)
        .initial_covariance(DMatrix::identity(4, 4) * 10.0)
        .build()
}

/// Scalar constant-position filter with `Q = 0`, `R = 1`, `x₀ = 0`, `P₀ = 1`.
pub fn scalar_filter(alpha: f64) -> FadingKalmanFilter {
    let config = FadingConfig::constant_position_1d(alpha, 0.0, 1.0);
    FadingKalmanFilter::from_config(&config).expect("valid config")
}

/// Random symmetric positive definite matrix
pub fn random_spd(rng: &mut StdRng, n: usize, scale: f64) -> DMatrix<f64> {
    let a = DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0));
    (&a * a.transpose() + DMatrix::identity(n, n) * 0.1) * scale
}

/// Random well-conditioned transition close to identity
pub fn random_transition(rng: &mut StdRng, n: usize) -> DMatrix<f64> {
    DMatrix::identity(n, n) + DMatrix::from_fn(n, n, |_, _| rng.gen_range(-0.2..0.2))
}

/// Random dense measurement matrix
pub fn random_observation(rng: &mut StdRng, nz: usize, nx: usize) -> DMatrix<f64> {
    DMatrix::from_fn(nz, nx, |_, _| rng.gen_range(-1.0..1.0))
}

/// Random vector with entries in `[-scale, scale)`
pub fn random_vector(rng: &mut StdRng, n: usize, scale: f64) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.gen_range(-scale..scale))
}
