//! One-shot task executors
//!
//! An executor turns an input into an output (`process`) and then performs
//! its single permitted side effect (`commit`). No state is retained
//! between calls and no failure is retried here; retries belong to the
//! supervisor.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{DataPacket, Signal};
use crate::CoreError;

/// A stateless transform with a single commit step
#[async_trait]
pub trait Executable: Send + Sync {
    /// Input shape, usually built with [`consume_as`]
    type Input: Send + 'static;

    /// Output returned to the caller after commit
    type Output: Send + Sync + 'static;

    /// Name used in logs
    fn executor_name(&self) -> &str;

    /// Compute the output from the input
    async fn process(&self, input: Self::Input) -> Result<Self::Output, CoreError>;

    /// Persist the output, typically a store write or a commitment
    async fn commit(&self, output: &Self::Output) -> Result<(), CoreError>;

    /// `process` then `commit`; errors from either propagate unchanged
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, CoreError> {
        debug!(executor = %self.executor_name(), "Processing input");
        let output = self.process(input).await?;
        self.commit(&output).await?;
        debug!(executor = %self.executor_name(), "Committed output");
        Ok(output)
    }
}

/// Fold signals into a map from signal type to payload.
///
/// A later signal of the same type replaces an earlier one.
pub fn consume(signals: &[Signal]) -> HashMap<String, DataPacket> {
    signals
        .iter()
        .map(|signal| (signal.signal_type.clone(), signal.data.clone()))
        .collect()
}

/// Fold signals and decode the result into an executor's typed input
pub fn consume_as<T: DeserializeOwned>(signals: &[Signal]) -> Result<T, CoreError> {
    let object: serde_json::Map<String, serde_json::Value> = consume(signals)
        .into_iter()
        .map(|(signal_type, data)| (signal_type, data.into_value()))
        .collect();

    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| CoreError::ValidationError(format!("signals do not match executor input: {}", e)))
}
