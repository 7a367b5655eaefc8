//! Error types for the SAGA bridge.

use thiserror::Error;

/// Errors produced while preparing or running a SAGA algorithm.
#[derive(Error, Debug)]
pub enum SagaError {
    #[error("unsupported file format for parameter {param}: {source_id}")]
    UnsupportedFormat { param: String, source_id: String },

    #[error("Input layer {layer} has more than one band.\nMultiband layers are not supported by SAGA")]
    MultibandUnsupported { layer: String },

    #[error("Input layers do not have the same grid extent.")]
    ExtentMismatch,

    #[error("missing value for required parameter {0}")]
    MissingParameter(String),

    #[error("no exported layer recorded for parameter {0}")]
    MissingExport(String),

    #[error("invalid value for parameter {name}: {reason}")]
    InvalidParameterValue { name: String, reason: String },

    #[error("algorithm {0} has an extent parameter but no extent parameter names")]
    MissingExtentAliases(String),

    #[error("invalid declaration {file}: {reason}")]
    Declaration { file: String, reason: String },

    #[error("SAGA process failed: {0}")]
    ProcessFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("core error: {0}")]
    Core(#[from] sagabridge_core::Error),
}

impl SagaError {
    pub(crate) fn invalid_value(name: &str, reason: impl Into<String>) -> Self {
        SagaError::InvalidParameterValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for SAGA bridge operations.
pub type Result<T> = std::result::Result<T, SagaError>;
