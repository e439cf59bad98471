//! Error types for the fading-memory filter
//!
//! Every failure is returned to the immediate caller. The filter never
//! retries, logs, or substitutes a default result when a step fails.

use std::fmt;

/// Errors that can occur while configuring or running the filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A scalar construction parameter is out of range
    InvalidParameter {
        /// Description of the offending parameter
        description: String,
    },

    /// Operands of a matrix operation have incompatible shapes
    ShapeMismatch {
        /// Operation or matrix being checked (e.g. "F·x", "R override")
        context: String,
        /// Expected (rows, cols)
        expected: (usize, usize),
        /// Actual (rows, cols)
        actual: (usize, usize),
    },

    /// Matrix inversion failed
    SingularMatrix {
        /// Which matrix failed
        context: String,
    },

    /// A model matrix required by the operation was never assigned
    Unconfigured {
        /// Name of the missing matrix (e.g. "F", "H")
        matrix: &'static str,
    },
}

impl FilterError {
    pub(crate) fn invalid(description: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            description: description.into(),
        }
    }

    pub(crate) fn shape(
        context: impl Into<String>,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        FilterError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::InvalidParameter { description } => {
                write!(f, "Invalid parameter: {}", description)
            }
            FilterError::ShapeMismatch {
                context,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Shape mismatch in {}: expected {}x{}, got {}x{}",
                    context, expected.0, expected.1, actual.0, actual.1
                )
            }
            FilterError::SingularMatrix { context } => {
                write!(f, "Matrix inversion failed: {}", context)
            }
            FilterError::Unconfigured { matrix } => {
                write!(f, "Model matrix {} has not been assigned", matrix)
            }
        }
    }
}

impl std::error::Error for FilterError {}

/// Errors that can occur while loading a scenario file
#[derive(Debug)]
pub enum ScenarioError {
    /// Reading the file failed
    Io(std::io::Error),

    /// The JSON could not be parsed
    Parse(serde_json::Error),

    /// The scenario describes an invalid filter
    Filter(FilterError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Io(e) => write!(f, "Failed to read scenario: {}", e),
            ScenarioError::Parse(e) => write!(f, "Failed to parse scenario JSON: {}", e),
            ScenarioError::Filter(e) => write!(f, "Invalid scenario: {}", e),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Io(e) => Some(e),
            ScenarioError::Parse(e) => Some(e),
            ScenarioError::Filter(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ScenarioError {
    fn from(e: std::io::Error) -> Self {
        ScenarioError::Io(e)
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        ScenarioError::Parse(e)
    }
}

impl From<FilterError> for ScenarioError {
    fn from(e: FilterError) -> Self {
        ScenarioError::Filter(e)
    }
}
