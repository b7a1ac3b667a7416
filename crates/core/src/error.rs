//! Core Error Types
//!
//! Errors raised while loading governor configuration. The core crate only
//! reads and parses JSON, so the error set is limited to I/O and
//! serialization failures; the main crate extends it with telemetry and
//! runtime variants.

use thiserror::Error;

/// Core error type for the tree governor workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;
