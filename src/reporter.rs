//! Observability for filter execution.
//!
//! This module provides the [`StepReporter`] trait for debugging and research
//! instrumentation. Reporters receive callbacks at key points of a batch run
//! without putting logging into the recursion itself.
//!
//! The default [`NoOpReporter`] compiles to nothing. [`LoggingReporter`]
//! routes events through the `log` facade, [`DebugReporter`] keeps copies for
//! post-hoc inspection, and [`CompositeReporter`] fans out to two reporters.
//!
//! # Example
//!
//! ```
//! use fading_kalman::{DebugReporter, FadingConfig, FadingKalmanFilter, Measurement};
//!
//! let config = FadingConfig::constant_position_1d(1.05, 0.0, 1.0);
//! let mut filter = FadingKalmanFilter::from_config(&config).unwrap();
//!
//! let zs = vec![Measurement::scalar(1.0), Measurement::Missing];
//! let mut reporter = DebugReporter::new();
//! filter
//!     .batch_filter_with_reporter(&zs, None, false, &mut reporter)
//!     .unwrap();
//!
//! assert_eq!(reporter.prediction_events().len(), 2);
//! assert_eq!(reporter.update_events().len(), 1);
//! assert_eq!(reporter.missed_measurements(), &[1]);
//! ```

use nalgebra::{DMatrix, DVector};

use crate::types::{BatchOutput, Innovation};

// ============================================================================
// StepReporter Trait
// ============================================================================

/// Observability trait for filter execution.
///
/// All methods have default empty implementations, so you only need
/// to override the events you care about. Callbacks receive references;
/// clone inside the callback if the data must outlive it.
pub trait StepReporter {
    /// Called after a prediction step with the predicted state.
    fn on_prediction(&mut self, _step: usize, _x: &DVector<f64>, _p: &DMatrix<f64>) {}

    /// Called after a measurement update with its diagnostics and the
    /// posterior state.
    fn on_update(
        &mut self,
        _step: usize,
        _innovation: &Innovation,
        _x: &DVector<f64>,
        _p: &DMatrix<f64>,
    ) {
    }

    /// Called when a step carried no measurement and the update was skipped.
    fn on_missed_measurement(&mut self, _step: usize) {}

    /// Called once after a batch run has recorded every step.
    fn on_batch_complete(&mut self, _output: &BatchOutput) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Zero-cost reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl StepReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures all events for debugging.
///
/// Stores clones of every state passed to it, so memory grows with the
/// length of the run.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    predictions: Vec<(usize, DVector<f64>, DMatrix<f64>)>,
    updates: Vec<(usize, Innovation)>,
    missed: Vec<usize>,
    batches: usize,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        self.predictions.clear();
        self.updates.clear();
        self.missed.clear();
        self.batches = 0;
    }

    /// Captured predictions as (step, x, P).
    pub fn prediction_events(&self) -> &[(usize, DVector<f64>, DMatrix<f64>)] {
        &self.predictions
    }

    /// Captured updates as (step, innovation).
    pub fn update_events(&self) -> &[(usize, Innovation)] {
        &self.updates
    }

    /// Steps whose measurement was missing.
    pub fn missed_measurements(&self) -> &[usize] {
        &self.missed
    }

    /// Number of completed batch runs.
    pub fn batches_completed(&self) -> usize {
        self.batches
    }

    /// Total number of captured events across all types.
    pub fn total_events(&self) -> usize {
        self.predictions.len() + self.updates.len() + self.missed.len() + self.batches
    }
}

impl StepReporter for DebugReporter {
    fn on_prediction(&mut self, step: usize, x: &DVector<f64>, p: &DMatrix<f64>) {
        self.predictions.push((step, x.clone(), p.clone()));
    }

    fn on_update(
        &mut self,
        step: usize,
        innovation: &Innovation,
        _x: &DVector<f64>,
        _p: &DMatrix<f64>,
    ) {
        self.updates.push((step, innovation.clone()));
    }

    fn on_missed_measurement(&mut self, step: usize) {
        self.missed.push(step);
    }

    fn on_batch_complete(&mut self, _output: &BatchOutput) {
        self.batches += 1;
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that logs events using the log crate.
///
/// # Log Levels
///
/// - `on_batch_complete`: INFO
/// - `on_prediction`, `on_update`, `on_missed_measurement`: DEBUG
/// - full matrices (verbose mode only): TRACE
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    /// Whether to include full state and covariance in log messages
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose logging reporter that includes matrices.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl StepReporter for LoggingReporter {
    fn on_prediction(&mut self, step: usize, x: &DVector<f64>, p: &DMatrix<f64>) {
        log::debug!("Step {}: predicted, trace(P)={:.6}", step, p.trace());
        if self.verbose {
            log::trace!("  x={:?}", x.as_slice());
            log::trace!("  P={}", p);
        }
    }

    fn on_update(
        &mut self,
        step: usize,
        innovation: &Innovation,
        x: &DVector<f64>,
        p: &DMatrix<f64>,
    ) {
        log::debug!(
            "Step {}: updated, |y|={:.6}, trace(P)={:.6}",
            step,
            innovation.residual.norm(),
            p.trace()
        );
        if self.verbose {
            log::trace!("  x={:?}", x.as_slice());
            log::trace!("  K={}", innovation.gain);
            log::trace!("  S={}", innovation.covariance);
        }
    }

    fn on_missed_measurement(&mut self, step: usize) {
        log::debug!("Step {}: measurement missing, update skipped", step);
    }

    fn on_batch_complete(&mut self, output: &BatchOutput) {
        log::info!("Batch complete: {} steps", output.len());
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards events to two child reporters.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: StepReporter, B: StepReporter> {
    first: A,
    second: B,
}

impl<A: StepReporter, B: StepReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Get a reference to the first reporter.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a reference to the second reporter.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: StepReporter, B: StepReporter> StepReporter for CompositeReporter<A, B> {
    fn on_prediction(&mut self, step: usize, x: &DVector<f64>, p: &DMatrix<f64>) {
        self.first.on_prediction(step, x, p);
        self.second.on_prediction(step, x, p);
    }

    fn on_update(
        &mut self,
        step: usize,
        innovation: &Innovation,
        x: &DVector<f64>,
        p: &DMatrix<f64>,
    ) {
        self.first.on_update(step, innovation, x, p);
        self.second.on_update(step, innovation, x, p);
    }

    fn on_missed_measurement(&mut self, step: usize) {
        self.first.on_missed_measurement(step);
        self.second.on_missed_measurement(step);
    }

    fn on_batch_complete(&mut self, output: &BatchOutput) {
        self.first.on_batch_complete(output);
        self.second.on_batch_complete(output);
    }
}
