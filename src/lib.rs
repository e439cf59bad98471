/*!
# fading-kalman - Fading-memory Kalman filter

Rust implementation of the discrete-time linear Kalman filter with fading
memory. Every prediction inflates the propagated covariance by α², so older
measurements are geometrically down-weighted and the filter adapts faster
to dynamics that drift away from the model. With α = 1 it is the standard
Kalman filter.

## Modules

- [`filter`] - [`FadingKalmanFilter`], the [`Filter`] trait, error types
- [`config`] - [`FadingConfig`] and its builder, debugging snapshots
- [`types`] - Measurements, noise overrides, controls, batch output
- [`reporter`] - Observability hooks for batch runs
- [`linalg`] - Shape-checked linear algebra helpers
- [`scenario`] - JSON scenario files
- [`simulation`] - Deterministic linear-system simulation

## Example

```rust
use fading_kalman::{FadingConfig, FadingKalmanFilter, Measurement};

// Position/velocity model, position measured, 2% fading
let config = FadingConfig::constant_velocity_1d(1.02, 1.0, 0.1, 1.0);
let mut filter = FadingKalmanFilter::from_config(&config).unwrap();

let zs: Vec<Measurement> = vec![
    Measurement::scalar(1.0),
    Measurement::scalar(2.1),
    Measurement::Missing,
    Measurement::scalar(3.9),
];

let output = filter.batch_filter(&zs, None, false).unwrap();
assert_eq!(output.means.len(), 4);
assert_eq!(output.predicted_covariances.len(), 4);
```
*/

/// Fading-memory filter, filter trait and errors
pub mod filter;

/// Filter configuration and snapshots
pub mod config;

/// Input and output types
pub mod types;

/// Observability hooks
pub mod reporter;

/// Linear algebra utilities
pub mod linalg;

/// Scenario files
pub mod scenario;

/// Simulation utilities for tests and benchmarks
pub mod simulation;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::{FadingConfig, FadingConfigBuilder, FilterSnapshot};
pub use filter::{FadingKalmanFilter, Filter, FilterError, ScenarioError};
pub use reporter::{CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter, StepReporter};
pub use types::{BatchOutput, Control, Innovation, Measurement, NoiseCovariance, StepEstimate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
