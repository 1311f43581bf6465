//! Result and error types for fluent-check.
//!
//! Formatting and structural comparison are total and never produce these
//! errors. They are reserved for caller contract violations (bad
//! configuration, ordering values that have no order) and for the check
//! surface when a caller asks for a `Result` instead of a panic.

use thiserror::Error;

/// Result type for fluent-check operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that can occur in fluent-check
#[derive(Debug, Error)]
pub enum CheckError {
    /// String truncation length below the supported minimum
    #[error("String truncation length must be at least {minimum}, got {requested}")]
    InvalidTruncationLength {
        /// Requested length
        requested: usize,
        /// Smallest accepted length
        minimum: usize,
    },

    /// A setting read from the environment could not be parsed
    #[error("Invalid value {value:?} for {name}")]
    InvalidSetting {
        /// Environment variable name
        name: String,
        /// Raw value
        value: String,
    },

    /// Ordering asked for values without a total order
    #[error("Values of type {left} and {right} cannot be ordered")]
    NotComparable {
        /// Type of the left operand
        left: String,
        /// Type of the right operand
        right: String,
    },

    /// Grid dimensions do not match the number of items
    #[error("Grid of dimensions {dims:?} cannot hold {items} items")]
    InvalidGridShape {
        /// Requested dimensions
        dims: Vec<usize>,
        /// Number of items supplied
        items: usize,
    },

    /// A check failed
    #[error("{message}")]
    CheckFailed {
        /// Rendered failure message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
