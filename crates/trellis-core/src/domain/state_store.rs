//! Hierarchical key-value store with commitment tracking
//!
//! This module defines the store interface every service writes through.
//! A store is shared as `Arc<dyn StateStore>` by all services wired into
//! one system; backends decide how writes are serialised.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::commitment::{Commitment, TransitionMode, TransitionOutcome};
use crate::CoreError;

/// One row of a store; last write wins per key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Key the value is stored under
    pub key: String,

    /// Stored value
    pub value: Value,

    /// Time of the write
    pub timestamp: DateTime<Utc>,

    /// Optional signature supplied by the writer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl StateEntry {
    /// Create an entry stamped with the current time
    pub fn new(key: impl Into<String>, value: Value, signature: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp: Utc::now(),
            signature,
        }
    }
}

/// A store shared by every service that must observe the others' writes
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Display name; the dot-joined path from the root store
    fn name(&self) -> &str;

    /// How invalid commitment transitions are treated
    fn transition_mode(&self) -> TransitionMode;

    /// Insert or overwrite the entry at `key`
    async fn write(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.write_signed(key, value, None).await
    }

    /// Insert or overwrite the entry at `key`, recording a signature
    async fn write_signed(
        &self,
        key: &str,
        value: Value,
        signature: Option<String>,
    ) -> Result<(), CoreError>;

    /// Read the current value at `key`
    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError>;

    /// Snapshot of the current entries, one per key
    async fn get_all(&self) -> Result<Vec<StateEntry>, CoreError>;

    /// Create a pending commitment, replacing any previous one with this id
    async fn create_commitment(&self, id: &str, data: Value) -> Result<Commitment, CoreError>;

    /// pending -> committed
    async fn commit_commitment(&self, id: &str) -> Result<TransitionOutcome, CoreError>;

    /// pending -> failed
    async fn fail_commitment(&self, id: &str) -> Result<TransitionOutcome, CoreError>;

    /// Inspect a commitment
    async fn commitment(&self, id: &str) -> Result<Option<Commitment>, CoreError>;

    /// Snapshot of all commitments
    async fn commitments(&self) -> Result<Vec<Commitment>, CoreError>;

    /// Child store named `name`, created on first use.
    ///
    /// Repeated calls with the same name return the same instance.
    fn subsection(&self, name: &str) -> Arc<dyn StateStore>;
}

/// Typed helpers over [`StateStore`]
#[async_trait]
pub trait StateStoreExt: StateStore {
    /// Serialize `value` and write it at `key`
    async fn write_json<T>(&self, key: &str, value: &T) -> Result<(), CoreError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.write(key, value).await
    }

    /// Read the value at `key` and deserialize it
    async fn read_json<T>(&self, key: &str) -> Result<Option<T>, CoreError>
    where
        T: DeserializeOwned + Send,
    {
        match self.read(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

impl<S: StateStore + ?Sized> StateStoreExt for S {}
