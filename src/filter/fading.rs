//! Fading-memory linear Kalman filter.
//!
//! A standard discrete-time Kalman filter whose prediction step inflates the
//! propagated covariance by α²:
//!
//! - `x' = F·x + B·u`
//! - `P' = α²·F·P·Fᵀ + Q`
//!
//! The inflation makes the next update weight the new measurement more
//! heavily, so the contribution of a measurement taken `k` steps ago decays
//! roughly as `α^(-2k)`. With `α = 1` the recursion is exactly the standard
//! Kalman filter. The update step is the usual one with the Joseph-form
//! covariance update and no α² factor.
//!
//! The filter is a plain mutable value: `x` and `P` persist across calls,
//! while `K`, `S` and `y` are diagnostics of the most recent update.

use std::borrow::Cow;

use nalgebra::{DMatrix, DVector};

use crate::config::{validate_parameters, FadingConfig, FilterSnapshot};
use crate::linalg::{
    add, add_vec, expect_len, expect_shape, kalman_gain, log_gaussian_pdf, mahalanobis_distance,
    mul, mul_vec, sandwich, sub_vec,
};
use crate::reporter::{NoOpReporter, StepReporter};
use crate::types::{BatchOutput, Control, Innovation, Measurement, NoiseCovariance, StepEstimate};

use super::errors::FilterError;
use super::traits::Filter;

/// Fading-memory Kalman filter.
///
/// # Example
///
/// ```
/// use fading_kalman::{Control, FadingKalmanFilter, Measurement, NoiseCovariance};
/// use nalgebra::DMatrix;
///
/// let mut kf = FadingKalmanFilter::new(1.0, 1, 1, 0)
///     .unwrap()
///     .with_transition(DMatrix::identity(1, 1))
///     .with_observation(DMatrix::identity(1, 1))
///     .with_process_noise(DMatrix::zeros(1, 1));
///
/// kf.predict(&Control::None).unwrap();
/// kf.update(&Measurement::scalar(1.0), &NoiseCovariance::Default).unwrap();
///
/// assert!((kf.x()[0] - 0.5).abs() < 1e-12);
/// assert!((kf.p()[(0, 0)] - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct FadingKalmanFilter {
    alpha: f64,
    alpha_sq: f64,
    dim_x: usize,
    dim_z: usize,
    dim_u: usize,

    /// State estimate
    x: DVector<f64>,
    /// State covariance
    p: DMatrix<f64>,

    /// State transition matrix F
    f: Option<DMatrix<f64>>,
    /// Control transition matrix B
    b: Option<DMatrix<f64>>,
    /// Measurement matrix H
    h: Option<DMatrix<f64>>,
    /// Process noise Q
    q: DMatrix<f64>,
    /// Default measurement noise R
    r: DMatrix<f64>,

    /// K, S, y of the most recent non-skipped update
    last: Option<Innovation>,

    identity: DMatrix<f64>,

    /// State restored by `reset`
    initial_x: DVector<f64>,
    initial_p: DMatrix<f64>,

    /// Steps taken through `Filter::step`
    timestep: usize,
}

impl FadingKalmanFilter {
    /// Create a filter with default, unassigned model.
    ///
    /// `x = 0`, `P = Q = I`, `R = I`. `F`, `H` and `B` are unassigned and
    /// must be set before `predict`/`update`.
    ///
    /// # Errors
    /// [`FilterError::InvalidParameter`] if `alpha < 1`, `alpha` is not
    /// finite, `dim_x == 0` or `dim_z == 0`.
    pub fn new(alpha: f64, dim_x: usize, dim_z: usize, dim_u: usize) -> Result<Self, FilterError> {
        validate_parameters(alpha, dim_x, dim_z)?;

        Ok(Self {
            alpha,
            alpha_sq: alpha * alpha,
            dim_x,
            dim_z,
            dim_u,
            x: DVector::zeros(dim_x),
            p: DMatrix::identity(dim_x, dim_x),
            f: None,
            b: None,
            h: None,
            q: DMatrix::identity(dim_x, dim_x),
            r: DMatrix::identity(dim_z, dim_z),
            last: None,
            identity: DMatrix::identity(dim_x, dim_x),
            initial_x: DVector::zeros(dim_x),
            initial_p: DMatrix::identity(dim_x, dim_x),
            timestep: 0,
        })
    }

    /// Create a filter from a configuration, checking every assigned shape.
    pub fn from_config(config: &FadingConfig) -> Result<Self, FilterError> {
        config.validate()?;

        let mut filter = Self::new(config.alpha, config.dim_x, config.dim_z, config.dim_u)?;
        filter.f = config.transition.clone();
        filter.h = config.observation.clone();
        filter.b = config.control_transition.clone();
        if let Some(q) = &config.process_noise {
            filter.q = q.clone();
        }
        if let Some(r) = &config.measurement_noise {
            filter.r = r.clone();
        }
        if let Some(x) = &config.initial_state {
            filter.set_state(x.clone());
        }
        if let Some(p) = &config.initial_covariance {
            filter.set_covariance(p.clone());
        }
        Ok(filter)
    }

    // ------------------------------------------------------------------
    // Model assignment
    // ------------------------------------------------------------------

    /// Assign the state transition matrix F (dim_x × dim_x).
    pub fn set_transition(&mut self, f: DMatrix<f64>) {
        self.f = Some(f);
    }

    /// Assign the measurement matrix H (dim_z × dim_x).
    pub fn set_observation(&mut self, h: DMatrix<f64>) {
        self.h = Some(h);
    }

    /// Assign the control transition matrix B (dim_x × dim_u).
    pub fn set_control_transition(&mut self, b: DMatrix<f64>) {
        self.b = Some(b);
    }

    /// Assign the process noise Q (dim_x × dim_x).
    pub fn set_process_noise(&mut self, q: DMatrix<f64>) {
        self.q = q;
    }

    /// Assign the default measurement noise R (dim_z × dim_z).
    pub fn set_measurement_noise(&mut self, r: DMatrix<f64>) {
        self.r = r;
    }

    /// Assign the state estimate. Also becomes the state restored by `reset`.
    pub fn set_state(&mut self, x: DVector<f64>) {
        self.initial_x = x.clone();
        self.x = x;
    }

    /// Assign the covariance. Also becomes the covariance restored by `reset`.
    pub fn set_covariance(&mut self, p: DMatrix<f64>) {
        self.initial_p = p.clone();
        self.p = p;
    }

    /// Builder form of [`set_transition`](Self::set_transition).
    pub fn with_transition(mut self, f: DMatrix<f64>) -> Self {
        self.set_transition(f);
        self
    }

    /// Builder form of [`set_observation`](Self::set_observation).
    pub fn with_observation(mut self, h: DMatrix<f64>) -> Self {
        self.set_observation(h);
        self
    }

    /// Builder form of [`set_control_transition`](Self::set_control_transition).
    pub fn with_control_transition(mut self, b: DMatrix<f64>) -> Self {
        self.set_control_transition(b);
        self
    }

    /// Builder form of [`set_process_noise`](Self::set_process_noise).
    pub fn with_process_noise(mut self, q: DMatrix<f64>) -> Self {
        self.set_process_noise(q);
        self
    }

    /// Builder form of [`set_measurement_noise`](Self::set_measurement_noise).
    pub fn with_measurement_noise(mut self, r: DMatrix<f64>) -> Self {
        self.set_measurement_noise(r);
        self
    }

    /// Builder form of [`set_state`](Self::set_state).
    pub fn with_state(mut self, x: DVector<f64>) -> Self {
        self.set_state(x);
        self
    }

    /// Builder form of [`set_covariance`](Self::set_covariance).
    pub fn with_covariance(mut self, p: DMatrix<f64>) -> Self {
        self.set_covariance(p);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current state estimate x
    #[inline]
    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    /// Current covariance P
    #[inline]
    pub fn p(&self) -> &DMatrix<f64> {
        &self.p
    }

    /// State transition matrix F, if assigned
    #[inline]
    pub fn f(&self) -> Option<&DMatrix<f64>> {
        self.f.as_ref()
    }

    /// Measurement matrix H, if assigned
    #[inline]
    pub fn h(&self) -> Option<&DMatrix<f64>> {
        self.h.as_ref()
    }

    /// Control transition matrix B, if assigned
    #[inline]
    pub fn b(&self) -> Option<&DMatrix<f64>> {
        self.b.as_ref()
    }

    /// Process noise Q
    #[inline]
    pub fn q(&self) -> &DMatrix<f64> {
        &self.q
    }

    /// Default measurement noise R
    #[inline]
    pub fn r(&self) -> &DMatrix<f64> {
        &self.r
    }

    /// Fading factor α
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Covariance inflation factor α²
    #[inline]
    pub fn alpha_sq(&self) -> f64 {
        self.alpha_sq
    }

    /// State dimension
    #[inline]
    pub fn dim_x(&self) -> usize {
        self.dim_x
    }

    /// Measurement dimension
    #[inline]
    pub fn dim_z(&self) -> usize {
        self.dim_z
    }

    /// Control dimension
    #[inline]
    pub fn dim_u(&self) -> usize {
        self.dim_u
    }

    /// Diagnostics of the most recent update, `None` before the first one
    #[inline]
    pub fn last_innovation(&self) -> Option<&Innovation> {
        self.last.as_ref()
    }

    /// Kalman gain K of the most recent update
    #[inline]
    pub fn gain(&self) -> Option<&DMatrix<f64>> {
        self.last.as_ref().map(|inn| &inn.gain)
    }

    /// Innovation y of the most recent update
    #[inline]
    pub fn innovation(&self) -> Option<&DVector<f64>> {
        self.last.as_ref().map(|inn| &inn.residual)
    }

    /// Innovation covariance S of the most recent update
    #[inline]
    pub fn innovation_covariance(&self) -> Option<&DMatrix<f64>> {
        self.last.as_ref().map(|inn| &inn.covariance)
    }

    /// Log-likelihood `log N(y; 0, S)` of the most recent update
    pub fn log_likelihood(&self) -> Option<f64> {
        self.last
            .as_ref()
            .map(|inn| log_gaussian_pdf(&inn.residual, &inn.covariance))
    }

    /// Likelihood `N(y; 0, S)` of the most recent update
    pub fn likelihood(&self) -> Option<f64> {
        self.log_likelihood().map(f64::exp)
    }

    /// Mahalanobis distance `sqrt(yᵀ S⁻¹ y)` of the most recent update
    pub fn mahalanobis(&self) -> Option<f64> {
        self.last
            .as_ref()
            .map(|inn| mahalanobis_distance(&inn.residual, &inn.covariance))
    }

    /// Snapshot of the configuration and state for debugging
    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot::new(
            self.alpha,
            (self.dim_x, self.dim_z, self.dim_u),
            self.f.as_ref(),
            self.h.as_ref(),
            self.b.as_ref(),
            &self.q,
            &self.r,
            &self.x,
            &self.p,
            self.last
                .as_ref()
                .map(|inn| (&inn.gain, &inn.residual, &inn.covariance)),
        )
    }

    // ------------------------------------------------------------------
    // Recursion
    // ------------------------------------------------------------------

    fn transition(&self) -> Result<&DMatrix<f64>, FilterError> {
        let f = self.f.as_ref().ok_or(FilterError::Unconfigured { matrix: "F" })?;
        expect_shape(f, (self.dim_x, self.dim_x), "F")?;
        Ok(f)
    }

    fn observation(&self) -> Result<&DMatrix<f64>, FilterError> {
        let h = self.h.as_ref().ok_or(FilterError::Unconfigured { matrix: "H" })?;
        expect_shape(h, (self.dim_z, self.dim_x), "H")?;
        Ok(h)
    }

    /// `B·u`, or `None` when there is no control contribution
    fn control_term(&self, u: &Control) -> Result<Option<DVector<f64>>, FilterError> {
        let u = match u {
            Control::None => return Ok(None),
            Control::Input(u) => u,
        };
        if self.dim_u == 0 {
            if u.is_empty() {
                return Ok(None);
            }
            return Err(FilterError::shape("control input u", (0, 1), (u.len(), 1)));
        }
        expect_len(u, self.dim_u, "control input u")?;
        let b = self.b.as_ref().ok_or(FilterError::Unconfigured { matrix: "B" })?;
        expect_shape(b, (self.dim_x, self.dim_u), "B")?;
        mul_vec(b, u, "B·u").map(Some)
    }

    /// Measurement noise for one update
    fn resolve_noise<'a>(
        &'a self,
        r: &'a NoiseCovariance,
    ) -> Result<Cow<'a, DMatrix<f64>>, FilterError> {
        let nz = self.dim_z;
        match r {
            NoiseCovariance::Default => {
                expect_shape(&self.r, (nz, nz), "R")?;
                Ok(Cow::Borrowed(&self.r))
            }
            NoiseCovariance::Scalar(v) => Ok(Cow::Owned(DMatrix::identity(nz, nz) * *v)),
            NoiseCovariance::Full(m) => {
                expect_shape(m, (nz, nz), "R override")?;
                Ok(Cow::Borrowed(m))
            }
        }
    }

    /// Compute the prediction without committing it.
    ///
    /// `x' = F·x + B·u`, `P' = α²·F·P·Fᵀ + Q`
    fn compute_prediction(&self, u: &Control) -> Result<(DVector<f64>, DMatrix<f64>), FilterError> {
        let f = self.transition()?;

        let mut x = mul_vec(f, &self.x, "F·x")?;
        if let Some(bu) = self.control_term(u)? {
            x = add_vec(&x, &bu, "F·x + B·u")?;
        }

        let fpf = sandwich(f, &self.p, f, "F·P·Fᵀ")?;
        let p = add(&(fpf * self.alpha_sq), &self.q, "α²·F·P·Fᵀ + Q")?;

        Ok((x, p))
    }

    /// Predict the next state.
    ///
    /// Mutates `x` and `P` in place. On error nothing is changed.
    ///
    /// # Errors
    /// - [`FilterError::Unconfigured`] if F (or B, when a control is given) is unset
    /// - [`FilterError::ShapeMismatch`] for incompatible shapes, including a
    ///   non-empty control with `dim_u == 0`
    pub fn predict(&mut self, u: &Control) -> Result<(), FilterError> {
        let (x, p) = self.compute_prediction(u)?;
        self.x = x;
        self.p = p;
        Ok(())
    }

    /// Predict the next state without altering the filter.
    ///
    /// # Returns
    /// `(x', P')` computed exactly as [`predict`](Self::predict) would
    pub fn get_prediction(&self, u: &Control) -> Result<(DVector<f64>, DMatrix<f64>), FilterError> {
        self.compute_prediction(u)
    }

    /// Incorporate a measurement.
    ///
    /// A [`Measurement::Missing`] leaves the filter untouched and returns
    /// `Ok(None)`. Otherwise:
    ///
    /// - `y = z − H·x`
    /// - `S = H·P·Hᵀ + R`
    /// - `K = P·Hᵀ·S⁻¹`
    /// - `x = x + K·y`
    /// - `P = (I−K·H)·P·(I−K·H)ᵀ + K·R·Kᵀ`
    ///
    /// All quantities are computed before any field is written, so an error
    /// leaves `x`, `P` and the diagnostics as they were.
    ///
    /// # Errors
    /// - [`FilterError::Unconfigured`] if H is unset
    /// - [`FilterError::ShapeMismatch`] for a wrongly sized `z` or `R`
    /// - [`FilterError::SingularMatrix`] if `S` cannot be factorised
    pub fn update(
        &mut self,
        z: &Measurement,
        r: &NoiseCovariance,
    ) -> Result<Option<Innovation>, FilterError> {
        let z = match z {
            Measurement::Present(z) => z,
            Measurement::Missing => return Ok(None),
        };

        let h = self.observation()?;
        expect_len(z, self.dim_z, "measurement z")?;
        expect_shape(&self.p, (self.dim_x, self.dim_x), "P")?;
        let r = self.resolve_noise(r)?;

        let hx = mul_vec(h, &self.x, "H·x")?;
        let y = sub_vec(z, &hx, "z − H·x")?;

        let pht = mul(&self.p, &h.transpose(), "P·Hᵀ")?;
        let s = add(&mul(h, &pht, "H·P·Hᵀ")?, &r, "H·P·Hᵀ + R")?;

        let k = kalman_gain(&pht, &s, "innovation covariance S")?;

        let x = add_vec(&self.x, &mul_vec(&k, &y, "K·y")?, "x + K·y")?;

        // Joseph form keeps P symmetric under rounding in K
        let i_kh = &self.identity - mul(&k, h, "K·H")?;
        let p = add(
            &sandwich(&i_kh, &self.p, &i_kh, "(I−KH)·P·(I−KH)ᵀ")?,
            &sandwich(&k, &r, &k, "K·R·Kᵀ")?,
            "Joseph update",
        )?;

        let innovation = Innovation {
            residual: y,
            covariance: s,
            gain: k,
        };
        self.x = x;
        self.p = p;
        self.last = Some(innovation.clone());
        Ok(Some(innovation))
    }

    /// Residual `z − H·x` against the current state. Does not alter the filter.
    pub fn residual_of(&self, z: &DVector<f64>) -> Result<DVector<f64>, FilterError> {
        let h = self.observation()?;
        sub_vec(z, &mul_vec(h, &self.x, "H·x")?, "z − H·x")
    }

    /// Project an arbitrary state into measurement space: `H·x`.
    pub fn measurement_of_state(&self, x: &DVector<f64>) -> Result<DVector<f64>, FilterError> {
        let h = self.observation()?;
        mul_vec(h, x, "H·x")
    }

    /// Run the filter over a sequence of measurements.
    ///
    /// # Arguments
    /// * `zs` - Measurements in time order; [`Measurement::Missing`] skips the update
    /// * `rs` - Optional per-step noise, same length as `zs`; `None` uses `R` throughout
    /// * `update_first` - Update then predict at each step instead of predict then update
    ///
    /// # Returns
    /// Filtered and predicted means and covariances, one entry per step
    pub fn batch_filter(
        &mut self,
        zs: &[Measurement],
        rs: Option<&[NoiseCovariance]>,
        update_first: bool,
    ) -> Result<BatchOutput, FilterError> {
        self.batch_filter_with_reporter(zs, rs, update_first, &mut NoOpReporter)
    }

    /// [`batch_filter`](Self::batch_filter) with observability callbacks.
    ///
    /// Stops at the first failing step and returns its error; earlier steps
    /// have already been applied to the filter.
    pub fn batch_filter_with_reporter<R: StepReporter + ?Sized>(
        &mut self,
        zs: &[Measurement],
        rs: Option<&[NoiseCovariance]>,
        update_first: bool,
        reporter: &mut R,
    ) -> Result<BatchOutput, FilterError> {
        let n = zs.len();
        if let Some(rs) = rs {
            if rs.len() != n {
                return Err(FilterError::shape("measurement noise sequence", (n, 1), (rs.len(), 1)));
            }
        }

        let default_noise = NoiseCovariance::Default;
        let mut output = BatchOutput::with_capacity(n);

        for (i, z) in zs.iter().enumerate() {
            let r = rs.map_or(&default_noise, |rs| &rs[i]);

            if update_first {
                self.update_reported(i, z, r, reporter)?;
                output.record_filtered(&self.x, &self.p);

                self.predict(&Control::None)?;
                reporter.on_prediction(i, &self.x, &self.p);
                output.record_predicted(&self.x, &self.p);
            } else {
                self.predict(&Control::None)?;
                reporter.on_prediction(i, &self.x, &self.p);
                output.record_predicted(&self.x, &self.p);

                self.update_reported(i, z, r, reporter)?;
                output.record_filtered(&self.x, &self.p);
            }
        }

        reporter.on_batch_complete(&output);
        Ok(output)
    }

    fn update_reported<R: StepReporter + ?Sized>(
        &mut self,
        step: usize,
        z: &Measurement,
        r: &NoiseCovariance,
        reporter: &mut R,
    ) -> Result<(), FilterError> {
        match self.update(z, r)? {
            Some(innovation) => reporter.on_update(step, &innovation, &self.x, &self.p),
            None => reporter.on_missed_measurement(step),
        }
        Ok(())
    }
}

impl Filter for FadingKalmanFilter {
    fn step(&mut self, measurement: &Measurement) -> Result<StepEstimate, FilterError> {
        self.predict(&Control::None)?;
        self.update(measurement, &NoiseCovariance::Default)?;

        let estimate = StepEstimate {
            timestep: self.timestep,
            mean: self.x.clone(),
            covariance: self.p.clone(),
        };
        self.timestep += 1;
        Ok(estimate)
    }

    fn state(&self) -> (&DVector<f64>, &DMatrix<f64>) {
        (&self.x, &self.p)
    }

    fn reset(&mut self) {
        self.x = self.initial_x.clone();
        self.p = self.initial_p.clone();
        self.last = None;
        self.timestep = 0;
    }

    fn x_dim(&self) -> usize {
        self.dim_x
    }

    fn z_dim(&self) -> usize {
        self.dim_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_filter(alpha: f64) -> FadingKalmanFilter {
        FadingKalmanFilter::new(alpha, 1, 1, 0)
            .unwrap()
            .with_transition(DMatrix::identity(1, 1))
            .with_observation(DMatrix::identity(1, 1))
            .with_process_noise(DMatrix::zeros(1, 1))
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        assert!(matches!(
            FadingKalmanFilter::new(0.5, 1, 1, 0),
            Err(FilterError::InvalidParameter { .. })
        ));
        assert!(FadingKalmanFilter::new(1.0, 0, 1, 0).is_err());
        assert!(FadingKalmanFilter::new(1.0, 1, 0, 0).is_err());
        assert!(FadingKalmanFilter::new(f64::INFINITY, 1, 1, 0).is_err());
    }

    #[test]
    fn test_defaults() {
        let kf = FadingKalmanFilter::new(1.1, 3, 2, 1).unwrap();
        assert_eq!(kf.x(), &DVector::zeros(3));
        assert_eq!(kf.p(), &DMatrix::identity(3, 3));
        assert_eq!(kf.q(), &DMatrix::identity(3, 3));
        assert_eq!(kf.r(), &DMatrix::identity(2, 2));
        assert!(kf.f().is_none() && kf.h().is_none() && kf.b().is_none());
        assert!(kf.gain().is_none());
        assert!((kf.alpha_sq() - 1.21).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_scenario_alpha_one() {
        let mut kf = scalar_filter(1.0);
        kf.predict(&Control::None).unwrap();
        assert!((kf.p()[(0, 0)] - 1.0).abs() < 1e-12);

        kf.update(&Measurement::scalar(1.0), &NoiseCovariance::Default)
            .unwrap();
        assert!((kf.gain().unwrap()[(0, 0)] - 0.5).abs() < 1e-12);
        assert!((kf.x()[0] - 0.5).abs() < 1e-12);
        assert!((kf.p()[(0, 0)] - 0.5).abs() < 1e-12);
        assert!((kf.innovation().unwrap()[0] - 1.0).abs() < 1e-12);
        assert!((kf.innovation_covariance().unwrap()[(0, 0)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_scenario_alpha_inflates() {
        let mut kf = scalar_filter(1.1);
        kf.predict(&Control::None).unwrap();
        assert!((kf.p()[(0, 0)] - 1.21).abs() < 1e-12);

        kf.update(&Measurement::scalar(1.0), &NoiseCovariance::Default)
            .unwrap();
        let k = kf.gain().unwrap()[(0, 0)];
        assert!((k - 1.21 / 2.21).abs() < 1e-12);
        assert!(k > 0.5);
    }

    #[test]
    fn test_unconfigured_matrices() {
        let mut kf = FadingKalmanFilter::new(1.0, 2, 1, 0).unwrap();
        assert_eq!(
            kf.predict(&Control::None),
            Err(FilterError::Unconfigured { matrix: "F" })
        );
        assert_eq!(
            kf.update(&Measurement::scalar(1.0), &NoiseCovariance::Default),
            Err(FilterError::Unconfigured { matrix: "H" })
        );
        assert!(kf.residual_of(&DVector::zeros(1)).is_err());
        assert!(kf.measurement_of_state(&DVector::zeros(2)).is_err());

        // Missing measurement is a no-op even before H is assigned
        assert_eq!(kf.update(&Measurement::Missing, &NoiseCovariance::Default), Ok(None));
    }

    #[test]
    fn test_control_input() {
        let mut kf = scalar_filter(1.0).with_state(DVector::from_vec(vec![1.0]));
        let u = Control::Input(DVector::from_vec(vec![2.0]));
        assert!(matches!(
            kf.predict(&u),
            Err(FilterError::ShapeMismatch { .. })
        ));

        let mut kf = FadingKalmanFilter::new(1.0, 1, 1, 1)
            .unwrap()
            .with_transition(DMatrix::identity(1, 1))
            .with_state(DVector::from_vec(vec![1.0]));
        assert_eq!(kf.predict(&u), Err(FilterError::Unconfigured { matrix: "B" }));

        kf.set_control_transition(DMatrix::from_element(1, 1, 0.5));
        kf.predict(&u).unwrap();
        assert!((kf.x()[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_noise_override() {
        let mut a = scalar_filter(1.0);
        let mut b = scalar_filter(1.0).with_measurement_noise(DMatrix::from_element(1, 1, 4.0));

        a.update(&Measurement::scalar(1.0), &NoiseCovariance::Scalar(4.0))
            .unwrap();
        b.update(&Measurement::scalar(1.0), &NoiseCovariance::Default)
            .unwrap();
        assert!((a.x()[0] - b.x()[0]).abs() < 1e-12);
        assert!((a.p()[(0, 0)] - 0.8).abs() < 1e-12);

        let bad = NoiseCovariance::Full(DMatrix::identity(2, 2));
        let before = a.x().clone();
        assert!(matches!(
            a.update(&Measurement::scalar(1.0), &bad),
            Err(FilterError::ShapeMismatch { .. })
        ));
        assert_eq!(a.x(), &before);
    }

    #[test]
    fn test_singular_innovation_covariance() {
        let mut kf = scalar_filter(1.0)
            .with_covariance(DMatrix::zeros(1, 1))
            .with_measurement_noise(DMatrix::zeros(1, 1));
        let err = kf
            .update(&Measurement::scalar(1.0), &NoiseCovariance::Default)
            .unwrap_err();
        assert!(matches!(err, FilterError::SingularMatrix { .. }));
        assert_eq!(kf.x()[0], 0.0);
        assert!(kf.last_innovation().is_none());
    }

    #[test]
    fn test_wrong_measurement_length() {
        let mut kf = scalar_filter(1.0);
        let z = Measurement::from_slice(&[1.0, 2.0]);
        assert!(matches!(
            kf.update(&z, &NoiseCovariance::Default),
            Err(FilterError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_step_and_reset() {
        let mut kf = scalar_filter(1.0);
        let first = kf.step(&Measurement::scalar(1.0)).unwrap();
        let second = kf.step(&Measurement::Missing).unwrap();
        assert_eq!(first.timestep, 0);
        assert_eq!(second.timestep, 1);
        assert_eq!(second.mean, first.mean);

        kf.reset();
        let (x, p) = kf.state();
        assert_eq!(x[0], 0.0);
        assert_eq!(p[(0, 0)], 1.0);
        assert!(kf.gain().is_none());
        assert_eq!(kf.step(&Measurement::Missing).unwrap().timestep, 0);
    }

    #[test]
    fn test_likelihood_diagnostics() {
        let mut kf = scalar_filter(1.0);
        assert!(kf.log_likelihood().is_none());
        kf.update(&Measurement::scalar(0.0), &NoiseCovariance::Default)
            .unwrap();
        // y = 0, S = 2
        let expected = -0.5 * ((2.0 * std::f64::consts::PI).ln() + 2.0_f64.ln());
        assert!((kf.log_likelihood().unwrap() - expected).abs() < 1e-12);
        assert!((kf.likelihood().unwrap() - expected.exp()).abs() < 1e-12);
        assert_eq!(kf.mahalanobis(), Some(0.0));
    }

    #[test]
    fn test_batch_rejects_mismatched_noise_sequence() {
        let mut kf = scalar_filter(1.0);
        let zs = vec![Measurement::scalar(1.0); 3];
        let rs = vec![NoiseCovariance::Default; 2];
        assert!(matches!(
            kf.batch_filter(&zs, Some(&rs), false),
            Err(FilterError::ShapeMismatch { .. })
        ));
        assert_eq!(kf.x()[0], 0.0);
    }

    #[test]
    fn test_snapshot_reports_state() {
        let mut kf = scalar_filter(1.1);
        assert!(kf.snapshot().gain.is_none());
        kf.step(&Measurement::scalar(2.0)).unwrap();

        let snap = kf.snapshot();
        assert_eq!(snap.dim_x, 1);
        assert!((snap.alpha_sq - 1.21).abs() < 1e-12);
        assert_eq!(snap.state, vec![kf.x()[0]]);
        assert!(snap.gain.is_some());
        assert!(snap.to_json_pretty().contains("\"alpha\""));
    }
}
