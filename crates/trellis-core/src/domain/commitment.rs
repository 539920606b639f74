//! Two-outcome commitment records
//!
//! A commitment is created `Pending` and is finalised exactly once, to
//! either `Committed` or `Failed`. Both outcomes are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

/// Lifecycle state of a commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentState {
    /// Created, not yet finalised
    Pending,
    /// Finalised successfully
    Committed,
    /// Finalised as failed
    Failed,
}

impl CommitmentState {
    /// Whether no further transition is allowed
    pub fn is_terminal(self) -> bool {
        !matches!(self, CommitmentState::Pending)
    }
}

impl fmt::Display for CommitmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommitmentState::Pending => "pending",
            CommitmentState::Committed => "committed",
            CommitmentState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a store reacts to a transition that is not pending -> terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    /// Invalid transitions are ignored
    #[default]
    Lenient,
    /// Invalid transitions are rejected with an error
    Strict,
}

impl std::str::FromStr for TransitionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(TransitionMode::Lenient),
            "strict" => Ok(TransitionMode::Strict),
            other => Err(CoreError::ConfigurationError(format!(
                "unknown transition mode: {}",
                other
            ))),
        }
    }
}

/// Result of a commit/fail request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The commitment moved out of pending
    Applied,
    /// Nothing changed (missing or already terminal, lenient mode only)
    Ignored,
}

/// A pending unit of work guarded for exactly-once finalisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// Identifier, unique within one store
    pub id: String,

    /// Opaque payload
    pub data: serde_json::Value,

    /// Current state
    pub state: CommitmentState,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Commitment {
    /// Create a pending commitment
    pub fn new(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            data,
            state: CommitmentState::Pending,
            timestamp: Utc::now(),
        }
    }

    /// Move to `to` if still pending.
    ///
    /// Backends call this while holding their write guard so the
    /// check and the update form one step.
    pub fn transition(
        &mut self,
        to: CommitmentState,
        mode: TransitionMode,
    ) -> Result<TransitionOutcome, CoreError> {
        if self.state == CommitmentState::Pending && to.is_terminal() {
            self.state = to;
            return Ok(TransitionOutcome::Applied);
        }

        match mode {
            TransitionMode::Lenient => Ok(TransitionOutcome::Ignored),
            TransitionMode::Strict => Err(CoreError::InvalidTransition {
                id: self.id.clone(),
                from: self.state,
                to,
            }),
        }
    }
}

/// Resolve a transition request against a possibly missing commitment
pub fn transition_missing(
    id: &str,
    mode: TransitionMode,
) -> Result<TransitionOutcome, CoreError> {
    match mode {
        TransitionMode::Lenient => Ok(TransitionOutcome::Ignored),
        TransitionMode::Strict => Err(CoreError::CommitmentNotFound(id.to_string())),
    }
}
