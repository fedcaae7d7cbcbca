//! Error types for neural_pn.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, training or persisting a OneClassPN model.
#[derive(Error, Debug)]
pub enum PointNetError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Dataset root or one of its index files is missing.
    #[error("dataset not found at {path:?}")]
    DatasetNotFound {
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// Requested class is not listed in the dataset category file.
    #[error("unknown class '{name}', available: {available:?}")]
    UnknownClass {
        /// The requested class name.
        name: String,
        /// Class names found in the dataset.
        available: Vec<String>,
    },

    /// The dataset split selected no samples.
    #[error("dataset split '{split}' is empty")]
    EmptyDataset {
        /// Name of the split.
        split: String,
    },

    /// Requested compute device cannot be used in this build.
    #[error("device unavailable: {message}")]
    DeviceUnavailable {
        /// Description of the problem.
        message: String,
    },

    /// Invalid or corrupted data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialisation error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Burn recorder failed to save or load a record.
    #[error("recorder error: {0}")]
    Recorder(#[from] burn::record::RecorderError),
}

impl PointNetError {
    /// Shorthand for an [`PointNetError::InvalidConfig`] error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for neural_pn operations.
pub type Result<T> = std::result::Result<T, PointNetError>;
