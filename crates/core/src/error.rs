//! Error types for SagaBridge core

use thiserror::Error;

/// Main error type for header and sidecar operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid header {path}: {reason}")]
    InvalidHeader { path: String, reason: String },

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for SagaBridge core operations
pub type Result<T> = std::result::Result<T, Error>;
