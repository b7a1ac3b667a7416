//! Error Handling
//!
//! Governor-wide error type. Extends the core error set with telemetry and
//! runtime failures. Build failures never appear here: `run_governed`
//! reports them as `BuildErrorDescriptor` values inside its outcome.

use thiserror::Error;
use tree_governor_core::CoreError;

/// Governor error type
#[derive(Error, Debug)]
pub enum GovernorError {
    /// Configuration, I/O and serialization errors from the core crate
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A host telemetry API is missing or refused a subscription
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// No async runtime was available for background work
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for governor errors
pub type GovernorResult<T> = Result<T, GovernorError>;

impl GovernorError {
    /// Create a telemetry error
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry(msg.into())
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<serde_json::Error> for GovernorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(CoreError::Serialization(err))
    }
}
