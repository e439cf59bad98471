//! Configuration types for the fading-memory filter
//!
//! [`FadingConfig`] describes a filter in one place: the fading factor, the
//! dimensions, and whichever model matrices are known. Matrices that are
//! left unset stay unset in the filter, so a half-configured model fails
//! with [`FilterError::Unconfigured`] instead of running on placeholders.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::filter::FilterError;
use crate::linalg::{expect_len, expect_shape};

/// Fading factor that reproduces the standard Kalman filter.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Complete description of a fading-memory filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FadingConfig {
    /// Fading factor α (≥ 1). The covariance is inflated by α² per prediction.
    pub alpha: f64,
    /// State dimension
    pub dim_x: usize,
    /// Measurement dimension
    pub dim_z: usize,
    /// Control dimension (0 when no control input is used)
    pub dim_u: usize,
    /// State transition matrix F (dim_x × dim_x)
    pub transition: Option<DMatrix<f64>>,
    /// Measurement matrix H (dim_z × dim_x)
    pub observation: Option<DMatrix<f64>>,
    /// Control transition matrix B (dim_x × dim_u)
    pub control_transition: Option<DMatrix<f64>>,
    /// Process noise Q (dim_x × dim_x), identity when unset
    pub process_noise: Option<DMatrix<f64>>,
    /// Measurement noise R (dim_z × dim_z), identity when unset
    pub measurement_noise: Option<DMatrix<f64>>,
    /// Initial state x₀, zero when unset
    pub initial_state: Option<DVector<f64>>,
    /// Initial covariance P₀, identity when unset
    pub initial_covariance: Option<DMatrix<f64>>,
}

impl FadingConfig {
    /// Create a configuration with no model matrices assigned.
    pub fn new(alpha: f64, dim_x: usize, dim_z: usize, dim_u: usize) -> Self {
        Self {
            alpha,
            dim_x,
            dim_z,
            dim_u,
            transition: None,
            observation: None,
            control_transition: None,
            process_noise: None,
            measurement_noise: None,
            initial_state: None,
            initial_covariance: None,
        }
    }

    /// Create with builder pattern.
    pub fn builder() -> FadingConfigBuilder {
        FadingConfigBuilder::default()
    }

    /// Check scalar parameters and the shape of every assigned matrix.
    pub fn validate(&self) -> Result<(), FilterError> {
        validate_parameters(self.alpha, self.dim_x, self.dim_z)?;

        let (nx, nz, nu) = (self.dim_x, self.dim_z, self.dim_u);
        if let Some(f) = &self.transition {
            expect_shape(f, (nx, nx), "F")?;
        }
        if let Some(h) = &self.observation {
            expect_shape(h, (nz, nx), "H")?;
        }
        if let Some(b) = &self.control_transition {
            if nu == 0 {
                return Err(FilterError::invalid(
                    "control transition B assigned but dim_u is 0",
                ));
            }
            expect_shape(b, (nx, nu), "B")?;
        }
        if let Some(q) = &self.process_noise {
            expect_shape(q, (nx, nx), "Q")?;
        }
        if let Some(r) = &self.measurement_noise {
            expect_shape(r, (nz, nz), "R")?;
        }
        if let Some(x) = &self.initial_state {
            expect_len(x, nx, "x₀")?;
        }
        if let Some(p) = &self.initial_covariance {
            expect_shape(p, (nx, nx), "P₀")?;
        }
        Ok(())
    }

    /// Constant-position model in one dimension.
    ///
    /// State: `[position]`, measured directly.
    /// F = [1], H = [1], Q = [q], R = [r]
    pub fn constant_position_1d(alpha: f64, process_noise: f64, measurement_noise: f64) -> Self {
        Self::builder()
            .alpha(alpha)
            .dimensions(1, 1, 0)
            .transition(DMatrix::identity(1, 1))
            .observation(DMatrix::identity(1, 1))
            .process_noise(DMatrix::from_element(1, 1, process_noise))
            .measurement_noise(DMatrix::from_element(1, 1, measurement_noise))
            .build()
    }

    /// Constant-velocity model in one dimension.
    ///
    /// State: `[position, velocity]`, position measured.
    ///
    /// Transition F = [1, dt; 0, 1]
    /// Process noise Q = q * [dt³/3, dt²/2; dt²/2, dt] (continuous white noise acceleration)
    pub fn constant_velocity_1d(
        alpha: f64,
        dt: f64,
        process_noise_std: f64,
        measurement_noise_std: f64,
    ) -> Self {
        #[rustfmt::skip]
        let f = DMatrix::from_row_slice(2, 2, &[
            1.0, dt,    // p' = p + dt*v
            0.0, 1.0,   // v' = v
        ]);

        let q = process_noise_std * process_noise_std;
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        #[rustfmt::skip]
        let process_noise = DMatrix::from_row_slice(2, 2, &[
            q * dt3 / 3.0,  q * dt2 / 2.0,
            q * dt2 / 2.0,  q * dt,
        ]);

        let h = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let r = DMatrix::from_element(1, 1, measurement_noise_std * measurement_noise_std);

        Self::builder()
            .alpha(alpha)
            .dimensions(2, 1, 0)
            .transition(f)
            .observation(h)
            .process_noise(process_noise)
            .measurement_noise(r)
            .build()
    }
}

/// Check the scalar construction parameters.
pub(crate) fn validate_parameters(
    alpha: f64,
    dim_x: usize,
    dim_z: usize,
) -> Result<(), FilterError> {
    if !alpha.is_finite() || alpha < 1.0 {
        return Err(FilterError::invalid(format!(
            "alpha must be a finite value >= 1, got {}",
            alpha
        )));
    }
    if dim_x == 0 {
        return Err(FilterError::invalid("dim_x must be > 0"));
    }
    if dim_z == 0 {
        return Err(FilterError::invalid("dim_z must be > 0"));
    }
    Ok(())
}

/// Builder for FadingConfig.
#[derive(Debug, Default)]
pub struct FadingConfigBuilder {
    alpha: Option<f64>,
    dims: Option<(usize, usize, usize)>,
    transition: Option<DMatrix<f64>>,
    observation: Option<DMatrix<f64>>,
    control_transition: Option<DMatrix<f64>>,
    process_noise: Option<DMatrix<f64>>,
    measurement_noise: Option<DMatrix<f64>>,
    initial_state: Option<DVector<f64>>,
    initial_covariance: Option<DMatrix<f64>>,
}

impl FadingConfigBuilder {
    /// Set the fading factor α.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Set state, measurement and control dimensions.
    pub fn dimensions(mut self, dim_x: usize, dim_z: usize, dim_u: usize) -> Self {
        self.dims = Some((dim_x, dim_z, dim_u));
        self
    }

    /// Set the state transition matrix F.
    pub fn transition(mut self, f: DMatrix<f64>) -> Self {
        self.transition = Some(f);
        self
    }

    /// Set the measurement matrix H.
    pub fn observation(mut self, h: DMatrix<f64>) -> Self {
        self.observation = Some(h);
        self
    }

    /// Set the control transition matrix B.
    pub fn control_transition(mut self, b: DMatrix<f64>) -> Self {
        self.control_transition = Some(b);
        self
    }

    /// Set the process noise Q.
    pub fn process_noise(mut self, q: DMatrix<f64>) -> Self {
        self.process_noise = Some(q);
        self
    }

    /// Set the default measurement noise R.
    pub fn measurement_noise(mut self, r: DMatrix<f64>) -> Self {
        self.measurement_noise = Some(r);
        self
    }

    /// Set the initial state x₀.
    pub fn initial_state(mut self, x: DVector<f64>) -> Self {
        self.initial_state = Some(x);
        self
    }

    /// Set the initial covariance P₀.
    pub fn initial_covariance(mut self, p: DMatrix<f64>) -> Self {
        self.initial_covariance = Some(p);
        self
    }

    /// Build the configuration.
    ///
    /// When dimensions are not given they are inferred from H (dim_z × dim_x)
    /// and B (dim_u), falling back to 1 × 1 with no control.
    pub fn build(self) -> FadingConfig {
        let (dim_x, dim_z, dim_u) = self.dims.unwrap_or_else(|| {
            let (dim_z, dim_x) = self
                .observation
                .as_ref()
                .map(|h| h.shape())
                .unwrap_or((1, 1));
            let dim_u = self.control_transition.as_ref().map_or(0, |b| b.ncols());
            (dim_x, dim_z, dim_u)
        });

        FadingConfig {
            alpha: self.alpha.unwrap_or(DEFAULT_ALPHA),
            dim_x,
            dim_z,
            dim_u,
            transition: self.transition,
            observation: self.observation,
            control_transition: self.control_transition,
            process_noise: self.process_noise,
            measurement_noise: self.measurement_noise,
            initial_state: self.initial_state,
            initial_covariance: self.initial_covariance,
        }
    }
}

// ============================================================================
// Filter Snapshots (for debugging/comparison)
// ============================================================================

fn flatten(m: &DMatrix<f64>) -> Vec<f64> {
    // Row-major, matching how the matrices are written in scenario files
    m.transpose().iter().copied().collect()
}

/// Snapshot of filter configuration and state for debugging.
///
/// Matrices are flattened row-major. Unassigned matrices and diagnostics
/// that do not exist yet serialise as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterSnapshot {
    /// Fading factor α
    pub alpha: f64,
    /// α²
    pub alpha_sq: f64,
    /// State dimension
    pub dim_x: usize,
    /// Measurement dimension
    pub dim_z: usize,
    /// Control dimension
    pub dim_u: usize,
    /// State transition matrix F
    pub transition: Option<Vec<f64>>,
    /// Measurement matrix H
    pub observation: Option<Vec<f64>>,
    /// Control transition matrix B
    pub control_transition: Option<Vec<f64>>,
    /// Process noise Q
    pub process_noise: Vec<f64>,
    /// Measurement noise R
    pub measurement_noise: Vec<f64>,
    /// Current state x
    pub state: Vec<f64>,
    /// Current covariance P
    pub covariance: Vec<f64>,
    /// Last Kalman gain K
    pub gain: Option<Vec<f64>>,
    /// Last innovation y
    pub innovation: Option<Vec<f64>>,
    /// Last innovation covariance S
    pub innovation_covariance: Option<Vec<f64>>,
}

impl FilterSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        alpha: f64,
        dims: (usize, usize, usize),
        f: Option<&DMatrix<f64>>,
        h: Option<&DMatrix<f64>>,
        b: Option<&DMatrix<f64>>,
        q: &DMatrix<f64>,
        r: &DMatrix<f64>,
        x: &DVector<f64>,
        p: &DMatrix<f64>,
        innovation: Option<(&DMatrix<f64>, &DVector<f64>, &DMatrix<f64>)>,
    ) -> Self {
        Self {
            alpha,
            alpha_sq: alpha * alpha,
            dim_x: dims.0,
            dim_z: dims.1,
            dim_u: dims.2,
            transition: f.map(flatten),
            observation: h.map(flatten),
            control_transition: b.map(flatten),
            process_noise: flatten(q),
            measurement_noise: flatten(r),
            state: x.iter().copied().collect(),
            covariance: flatten(p),
            gain: innovation.map(|(k, _, _)| flatten(k)),
            innovation: innovation.map(|(_, y, _)| y.iter().copied().collect()),
            innovation_covariance: innovation.map(|(_, _, s)| flatten(s)),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
