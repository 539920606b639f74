//! In-memory state store for Trellis pipelines
//!
//! This crate provides the in-process implementation of the
//! [`StateStore`] interface defined in trellis-core. Nothing is persisted;
//! it is the backend for development, tests and single-process pipelines.
//!
//! Each store guards its own entries and commitments, so writes to
//! different subsections never contend. Commitment transitions are a
//! check-and-set under one write guard, which keeps finalisation
//! exactly-once when several tasks race on the same id.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use trellis_core::{
    transition_missing, Commitment, CommitmentState, CoreError, StateEntry, StateStore,
    StoreConfig, TransitionMode, TransitionOutcome,
};

#[cfg(test)]
mod tests;

/// Hierarchical last-write-wins store with commitment tracking
pub struct InMemoryStateStore {
    name: String,
    mode: TransitionMode,
    entries: RwLock<HashMap<String, StateEntry>>,
    commitments: RwLock<HashMap<String, Commitment>>,
    subsections: DashMap<String, Arc<InMemoryStateStore>>,
}

impl InMemoryStateStore {
    /// Create a lenient root store
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_mode(name, TransitionMode::default())
    }

    /// Create a root store with an explicit transition mode
    pub fn with_mode(name: impl Into<String>, mode: TransitionMode) -> Self {
        Self {
            name: name.into(),
            mode,
            entries: RwLock::new(HashMap::new()),
            commitments: RwLock::new(HashMap::new()),
            subsections: DashMap::new(),
        }
    }

    /// Create a root store from configuration
    pub fn from_config(config: &StoreConfig) -> Self {
        info!(
            store = %config.root_name,
            mode = ?config.transition_mode,
            "Creating in-memory state store"
        );
        Self::with_mode(config.root_name.clone(), config.transition_mode)
    }

    /// Concrete handle to the child store `name`, created on first use
    pub fn subsection_store(&self, name: &str) -> Arc<InMemoryStateStore> {
        self.subsections
            .entry(name.to_string())
            .or_insert_with(|| {
                let path = format!("{}.{}", self.name, name);
                debug!(store = %path, "Creating subsection");
                Arc::new(InMemoryStateStore::with_mode(path, self.mode))
            })
            .value()
            .clone()
    }

    /// Names of the child stores created so far
    pub fn subsection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.subsections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    async fn finalise(&self, id: &str, to: CommitmentState) -> Result<TransitionOutcome, CoreError> {
        let mut commitments = self.commitments.write().await;
        let outcome = match commitments.get_mut(id) {
            Some(commitment) => commitment.transition(to, self.mode)?,
            None => transition_missing(id, self.mode)?,
        };
        debug!(store = %self.name, commitment = %id, to = %to, outcome = ?outcome, "Commitment transition");
        Ok(outcome)
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("subsections", &self.subsection_names())
            .finish()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn transition_mode(&self) -> TransitionMode {
        self.mode
    }

    async fn write_signed(
        &self,
        key: &str,
        value: Value,
        signature: Option<String>,
    ) -> Result<(), CoreError> {
        debug!(store = %self.name, key = %key, "Writing entry");
        let entry = StateEntry::new(key, value, signature);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.entries.read().await.get(key).map(|e| e.value.clone()))
    }

    async fn get_all(&self) -> Result<Vec<StateEntry>, CoreError> {
        let mut entries: Vec<StateEntry> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn create_commitment(&self, id: &str, data: Value) -> Result<Commitment, CoreError> {
        let commitment = Commitment::new(id, data);
        let previous = self
            .commitments
            .write()
            .await
            .insert(id.to_string(), commitment.clone());
        if let Some(previous) = previous {
            debug!(
                store = %self.name,
                commitment = %id,
                previous_state = %previous.state,
                "Replacing existing commitment"
            );
        } else {
            debug!(store = %self.name, commitment = %id, "Created commitment");
        }
        Ok(commitment)
    }

    async fn commit_commitment(&self, id: &str) -> Result<TransitionOutcome, CoreError> {
        self.finalise(id, CommitmentState::Committed).await
    }

    async fn fail_commitment(&self, id: &str) -> Result<TransitionOutcome, CoreError> {
        self.finalise(id, CommitmentState::Failed).await
    }

    async fn commitment(&self, id: &str) -> Result<Option<Commitment>, CoreError> {
        Ok(self.commitments.read().await.get(id).cloned())
    }

    async fn commitments(&self) -> Result<Vec<Commitment>, CoreError> {
        let mut commitments: Vec<Commitment> =
            self.commitments.read().await.values().cloned().collect();
        commitments.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(commitments)
    }

    fn subsection(&self, name: &str) -> Arc<dyn StateStore> {
        self.subsection_store(name)
    }
}
