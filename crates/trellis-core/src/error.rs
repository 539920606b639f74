use thiserror::Error;

use crate::domain::commitment::CommitmentState;

/// Core error type for the Trellis runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No flow is registered under the requested name
    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    /// An event was delivered to, or an operation drove, a stopped service
    #[error("Service not running: {0}")]
    ServiceNotRunning(String),

    /// Failure raised by a collaborator's process, commit or ingest hook
    #[error("Operation error: {0}")]
    OperationError(String),

    /// Payload did not match the schema expected at an ingestion boundary
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Commitment transition rejected by a strict store
    #[error("Invalid commitment transition for {id}: {from} -> {to}")]
    InvalidTransition {
        /// Commitment identifier
        id: String,
        /// State the commitment was in
        from: CommitmentState,
        /// State the caller asked for
        to: CommitmentState,
    },

    /// Commitment lookup failed in a strict store
    #[error("Commitment not found: {0}")]
    CommitmentNotFound(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
