//! Scenario files for replaying a batch run.
//!
//! A scenario is a JSON document holding a filter model and a measurement
//! sequence. Matrices are written row-major as flat arrays. A step whose `z`
//! is `null` is a missed measurement; a step's optional `r` is either a
//! number (scalar noise override) or a flat `dim_z × dim_z` array.
//!
//! ```json
//! {
//!   "alpha": 1.02,
//!   "dim_x": 2,
//!   "dim_z": 1,
//!   "transition": [1.0, 1.0, 0.0, 1.0],
//!   "observation": [1.0, 0.0],
//!   "steps": [{ "z": [1.0] }, { "z": null }, { "z": [2.1], "r": 0.5 }]
//! }
//! ```

use std::fs;
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;

use crate::config::FadingConfig;
use crate::filter::{FadingKalmanFilter, FilterError, ScenarioError};
use crate::types::{BatchOutput, Measurement, NoiseCovariance};

// =============================================================================
// JSON Schema for Scenario Files
// =============================================================================

/// Root structure for scenario JSON files
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioJson {
    /// Fading factor α
    pub alpha: f64,
    /// State dimension
    pub dim_x: usize,
    /// Measurement dimension
    pub dim_z: usize,
    /// Control dimension, 0 when absent
    #[serde(default)]
    pub dim_u: usize,
    /// F, dim_x × dim_x row-major
    pub transition: Vec<f64>,
    /// H, dim_z × dim_x row-major
    pub observation: Vec<f64>,
    /// B, dim_x × dim_u row-major
    #[serde(default)]
    pub control_transition: Option<Vec<f64>>,
    /// Q, dim_x × dim_x row-major; identity when absent
    #[serde(default)]
    pub process_noise: Option<Vec<f64>>,
    /// Default R, dim_z × dim_z row-major; identity when absent
    #[serde(default)]
    pub measurement_noise: Option<Vec<f64>>,
    /// x₀ of length dim_x; zero when absent
    #[serde(default)]
    pub initial_state: Option<Vec<f64>>,
    /// P₀, dim_x × dim_x row-major; identity when absent
    #[serde(default)]
    pub initial_covariance: Option<Vec<f64>>,
    /// Update before predicting at each step
    #[serde(default)]
    pub update_first: bool,
    /// Measurement sequence
    pub steps: Vec<StepJson>,
}

/// Single timestep data from scenario JSON
#[derive(Debug, Clone, Deserialize)]
pub struct StepJson {
    /// Measurement, `null` when missing
    #[serde(default)]
    pub z: Option<Vec<f64>>,
    /// Noise override for this step
    #[serde(default)]
    pub r: Option<NoiseJson>,
}

/// Noise override written as a number or a flat matrix
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NoiseJson {
    /// `v · I(dim_z)`
    Scalar(f64),
    /// Full dim_z × dim_z matrix, row-major
    Matrix(Vec<f64>),
}

/// Build a matrix from row-major values
fn matrix_from_rows(
    values: &[f64],
    rows: usize,
    cols: usize,
    name: &str,
) -> Result<DMatrix<f64>, FilterError> {
    if values.len() != rows * cols {
        return Err(FilterError::shape(name, (rows, cols), (values.len(), 1)));
    }
    Ok(DMatrix::from_row_slice(rows, cols, values))
}

impl ScenarioJson {
    /// Filter configuration described by the scenario
    pub fn to_config(&self) -> Result<FadingConfig, FilterError> {
        let (nx, nz, nu) = (self.dim_x, self.dim_z, self.dim_u);

        let mut config = FadingConfig::new(self.alpha, nx, nz, nu);
        config.transition = Some(matrix_from_rows(&self.transition, nx, nx, "transition")?);
        config.observation = Some(matrix_from_rows(&self.observation, nz, nx, "observation")?);
        config.control_transition = self
            .control_transition
            .as_deref()
            .map(|b| matrix_from_rows(b, nx, nu, "control_transition"))
            .transpose()?;
        config.process_noise = self
            .process_noise
            .as_deref()
            .map(|q| matrix_from_rows(q, nx, nx, "process_noise"))
            .transpose()?;
        config.measurement_noise = self
            .measurement_noise
            .as_deref()
            .map(|r| matrix_from_rows(r, nz, nz, "measurement_noise"))
            .transpose()?;
        config.initial_state = self
            .initial_state
            .as_deref()
            .map(DVector::from_column_slice);
        config.initial_covariance = self
            .initial_covariance
            .as_deref()
            .map(|p| matrix_from_rows(p, nx, nx, "initial_covariance"))
            .transpose()?;

        config.validate()?;
        Ok(config)
    }

    /// Measurement sequence, missing steps as [`Measurement::Missing`]
    pub fn measurements(&self) -> Vec<Measurement> {
        self.steps
            .iter()
            .map(|s| match &s.z {
                Some(z) => Measurement::from_slice(z),
                None => Measurement::Missing,
            })
            .collect()
    }

    /// Per-step noise overrides, or `None` if no step overrides `R`
    pub fn noise_overrides(&self) -> Result<Option<Vec<NoiseCovariance>>, FilterError> {
        if self.steps.iter().all(|s| s.r.is_none()) {
            return Ok(None);
        }

        let nz = self.dim_z;
        self.steps
            .iter()
            .map(|s| match &s.r {
                None => Ok(NoiseCovariance::Default),
                Some(NoiseJson::Scalar(v)) => Ok(NoiseCovariance::Scalar(*v)),
                Some(NoiseJson::Matrix(m)) => {
                    matrix_from_rows(m, nz, nz, "step r").map(NoiseCovariance::Full)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Parse a scenario from a JSON string
pub fn parse_scenario(json: &str) -> Result<ScenarioJson, ScenarioError> {
    Ok(serde_json::from_str(json)?)
}

/// Load a scenario from a JSON file
pub fn load_scenario(path: impl AsRef<Path>) -> Result<ScenarioJson, ScenarioError> {
    let content = fs::read_to_string(path)?;
    parse_scenario(&content)
}

/// Build the scenario's filter and run its measurements through `batch_filter`
pub fn run_scenario(scenario: &ScenarioJson) -> Result<BatchOutput, ScenarioError> {
    let config = scenario.to_config()?;
    let mut filter = FadingKalmanFilter::from_config(&config)?;

    let zs = scenario.measurements();
    let rs = scenario.noise_overrides()?;

    log::debug!(
        "Running scenario: alpha={}, {} steps, update_first={}",
        scenario.alpha,
        zs.len(),
        scenario.update_first
    );

    Ok(filter.batch_filter(&zs, rs.as_deref(), scenario.update_first)?)
}
