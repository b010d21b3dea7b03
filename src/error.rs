//! Error types for the htm-cla crate.
//!
//! Caller-facing failures (bad configuration, wrongly sized input vectors,
//! out-of-range queries) are reported through [`ClaError`]. Violated internal
//! invariants are assertion panics, and capacity exhaustion during learning is
//! not an error at all.

use thiserror::Error;

/// The main error type for layer operations.
#[derive(Error, Debug)]
pub enum ClaError {
    /// A derived buffer was read before the phase that fills it ran
    #[error("Not initialized: {0}")]
    NotInitialized(&'static str),

    /// Input vector length does not match `input_vector_length`
    #[error("Invalid input size: expected {expected}, got {actual}")]
    InvalidInputSize {
        /// Expected size
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Invalid configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Query index out of the configured bounds
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds {
        /// The index that was accessed
        index: usize,
        /// The valid length
        length: usize,
    },

    /// JSON encoding or decoding of parameters failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encoding or decoding of parameters failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// A specialized `Result` type for layer operations.
pub type Result<T> = std::result::Result<T, ClaError>;

impl ClaError {
    /// Shorthand for [`ClaError::InvalidParameter`].
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ClaError::InvalidParameter(msg.into())
    }
}
