//! Error types for training tasks.

use thiserror::Error;

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Errors that can occur while configuring or stepping a task.
#[derive(Error, Debug)]
pub enum TrainError {
    /// A configuration hook failed.
    #[error("Failed to configure {hook}: {reason}")]
    ConfigureError {
        /// Hook name (`losses`, `metrics`, `models`).
        hook: &'static str,
        /// Failure description.
        reason: String,
    },

    /// The scheduler's monitored value was not among the logged values.
    #[error("Monitored metric `{monitor}` not found; available: [{}]", .available.join(", "))]
    MonitorNotFound {
        /// Monitored key.
        monitor: String,
        /// Keys that were logged.
        available: Vec<String>,
    },

    /// Invalid learning rate.
    #[error("Invalid learning rate: {0}")]
    InvalidLearningRate(String),

    /// Batch does not match what the task expects.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] geotrain_core::CoreError),

    /// Other error.
    #[error("{0}")]
    Other(String),
}
