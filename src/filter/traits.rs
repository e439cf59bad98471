//! Core traits for filters
//!
//! This module defines the one-step interface shared by state estimators.

use nalgebra::{DMatrix, DVector};

use crate::types::{Measurement, StepEstimate};

use super::errors::FilterError;

/// Core filter trait
///
/// Provides a uniform way to drive an estimator one observation at a time,
/// regardless of how it predicts and corrects internally.
pub trait Filter {
    /// Process one timestep and return the posterior estimate
    ///
    /// # Arguments
    /// * `measurement` - Observation for this step, possibly missing
    ///
    /// # Returns
    /// Posterior estimate or error
    fn step(&mut self, measurement: &Measurement) -> Result<StepEstimate, FilterError>;

    /// Get current state mean and covariance (read-only)
    fn state(&self) -> (&DVector<f64>, &DMatrix<f64>);

    /// Reset filter to initial state
    fn reset(&mut self);

    /// Get state dimension
    fn x_dim(&self) -> usize;

    /// Get measurement dimension
    fn z_dim(&self) -> usize;
}
