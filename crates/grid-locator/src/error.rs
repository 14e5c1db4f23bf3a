//! Error types for grid location.

use thiserror::Error;

/// Errors that can occur while locating points or resampling series.
#[derive(Error, Debug)]
pub enum GridLocatorError {
    /// The coordinate grid has no valid cells.
    #[error("grid has no valid cells: {0}")]
    EmptyGrid(String),

    /// Array lengths disagree with the declared shape.
    #[error("shape mismatch: expected {expected} values, got {actual} ({context})")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Source sample times are not strictly increasing.
    #[error("sample times are not strictly increasing: {0}")]
    NotMonotonic(String),

    /// A target time lies outside the span of the source samples.
    #[error("target time {target} outside sample span [{first}, {last}]")]
    OutsideSamples {
        target: String,
        first: String,
        last: String,
    },
}

impl GridLocatorError {
    /// Create an EmptyGrid error.
    pub fn empty_grid(msg: impl Into<String>) -> Self {
        Self::EmptyGrid(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: usize, actual: usize, context: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected,
            actual,
            context: context.into(),
        }
    }
}

/// Result type for grid locator operations.
pub type Result<T> = std::result::Result<T, GridLocatorError>;
