//! Filter implementations
//!
//! - [`Filter`] - One-step trait implemented by estimators
//! - [`FadingKalmanFilter`] - Fading-memory linear Kalman filter
//! - [`FilterError`] / [`ScenarioError`] - Error types

pub mod errors;
pub mod fading;
pub mod traits;

pub use errors::{FilterError, ScenarioError};
pub use fading::FadingKalmanFilter;
pub use traits::Filter;
