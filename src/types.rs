//! Input and output types for the filter recursion.
//!
//! - [`Measurement`] - A measurement vector or an explicit missed observation
//! - [`NoiseCovariance`] - Per-call measurement noise override
//! - [`Control`] - Optional control input for the prediction step
//! - [`Innovation`] - Diagnostics produced by one update
//! - [`StepEstimate`] - Filter state after one predict/update cycle
//! - [`BatchOutput`] - Snapshots recorded by `batch_filter`

use nalgebra::{DMatrix, DVector};

/// A single time step's observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Observed measurement vector of length `dim_z`.
    Present(DVector<f64>),
    /// No observation at this step. The update is skipped.
    Missing,
}

impl Measurement {
    /// Create a present measurement from a slice
    pub fn from_slice(values: &[f64]) -> Self {
        Measurement::Present(DVector::from_column_slice(values))
    }

    /// Create a present scalar measurement
    pub fn scalar(value: f64) -> Self {
        Measurement::Present(DVector::from_element(1, value))
    }

    /// Whether the step carries an observation
    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, Measurement::Present(_))
    }

    /// Borrow the measurement vector, if any
    #[inline]
    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            Measurement::Present(z) => Some(z),
            Measurement::Missing => None,
        }
    }
}

impl From<DVector<f64>> for Measurement {
    fn from(z: DVector<f64>) -> Self {
        Measurement::Present(z)
    }
}

impl From<Option<DVector<f64>>> for Measurement {
    fn from(z: Option<DVector<f64>>) -> Self {
        match z {
            Some(z) => Measurement::Present(z),
            None => Measurement::Missing,
        }
    }
}

/// Measurement noise used by a single update.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NoiseCovariance {
    /// Use the filter's stored `R`.
    #[default]
    Default,
    /// Use `v · I(dim_z)`.
    Scalar(f64),
    /// Use the given `dim_z × dim_z` matrix.
    Full(DMatrix<f64>),
}

impl From<f64> for NoiseCovariance {
    fn from(v: f64) -> Self {
        NoiseCovariance::Scalar(v)
    }
}

impl From<DMatrix<f64>> for NoiseCovariance {
    fn from(m: DMatrix<f64>) -> Self {
        NoiseCovariance::Full(m)
    }
}

/// Control input for the prediction step.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Control {
    /// No control; `B·u` contributes nothing.
    #[default]
    None,
    /// Control vector of length `dim_u`, multiplied by `B`.
    Input(DVector<f64>),
}

impl From<DVector<f64>> for Control {
    fn from(u: DVector<f64>) -> Self {
        Control::Input(u)
    }
}

/// Diagnostics from one measurement update.
#[derive(Debug, Clone, PartialEq)]
pub struct Innovation {
    /// Residual `y = z − H·x`
    pub residual: DVector<f64>,
    /// Innovation covariance `S = H·P·Hᵀ + R`
    pub covariance: DMatrix<f64>,
    /// Kalman gain `K = P·Hᵀ·S⁻¹`
    pub gain: DMatrix<f64>,
}

/// Filter state after one `Filter::step`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEstimate {
    /// Step index (0-based)
    pub timestep: usize,
    /// Posterior mean
    pub mean: DVector<f64>,
    /// Posterior covariance
    pub covariance: DMatrix<f64>,
}

/// Per-step snapshots recorded by `batch_filter`.
///
/// Every entry is an owned copy; later filter mutation does not alter it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    /// State after the update at each step
    pub means: Vec<DVector<f64>>,
    /// Covariance after the update at each step
    pub covariances: Vec<DMatrix<f64>>,
    /// State after the prediction at each step
    pub predicted_means: Vec<DVector<f64>>,
    /// Covariance after the prediction at each step
    pub predicted_covariances: Vec<DMatrix<f64>>,
}

impl BatchOutput {
    /// Create an empty output with room for `n` steps
    pub fn with_capacity(n: usize) -> Self {
        Self {
            means: Vec::with_capacity(n),
            covariances: Vec::with_capacity(n),
            predicted_means: Vec::with_capacity(n),
            predicted_covariances: Vec::with_capacity(n),
        }
    }

    /// Number of recorded steps
    #[inline]
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Whether no steps were recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub(crate) fn record_filtered(&mut self, x: &DVector<f64>, p: &DMatrix<f64>) {
        self.means.push(x.clone());
        self.covariances.push(p.clone());
    }

    pub(crate) fn record_predicted(&mut self, x: &DVector<f64>, p: &DMatrix<f64>) {
        self.predicted_means.push(x.clone());
        self.predicted_covariances.push(p.clone());
    }
}
