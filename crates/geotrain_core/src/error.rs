//! Error types for geotrain_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in geotrain_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required hyperparameter was not captured.
    #[error("Missing hyperparameter: {key}")]
    MissingHyperparameter {
        /// Hyperparameter name.
        key: String,
    },

    /// A hyperparameter is present but has the wrong type or value.
    #[error("Invalid hyperparameter {key}: expected {expected}, got {got}")]
    InvalidHyperparameter {
        /// Hyperparameter name.
        key: String,
        /// Expected type or value description.
        expected: String,
        /// Actual value.
        got: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    pub(crate) fn invalid(key: &str, expected: &str, got: impl ToString) -> Self {
        Self::InvalidHyperparameter {
            key: key.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
