//! External ingestion boundaries
//!
//! An ingestion boundary is the one place outside data enters the system.
//! Each named source keeps its most recent payload; deriving signals from
//! it is left to the implementor's `on_ingest`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use super::registry::OrderedRegistry;
use super::signal_bus::{Emitter, SignalSink};
use crate::types::{DataPacket, Signal};
use crate::CoreError;

/// Feed table and emitter carried by every ingestion boundary
#[derive(Debug)]
pub struct IngestionCore {
    name: String,
    feeds: RwLock<OrderedRegistry<DataPacket>>,
    emitter: Emitter,
}

impl IngestionCore {
    /// Create a boundary core with no recorded feeds
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            emitter: Emitter::new(name.clone()),
            name,
            feeds: RwLock::new(OrderedRegistry::new()),
        }
    }

    /// Boundary name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overwrite the last payload for `source`
    pub fn record(&self, source: &str, data: DataPacket) {
        self.feeds.write().insert(source, data);
    }

    /// Last payload ingested from `source`
    pub fn feed(&self, source: &str) -> Option<DataPacket> {
        self.feeds.read().get(source).cloned()
    }

    /// Sources seen so far, in first-arrival order
    pub fn sources(&self) -> Vec<String> {
        self.feeds.read().names().map(str::to_string).collect()
    }

    /// Handle used to emit derived signals
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    /// Route derived signals to `sink`
    pub fn connect(&self, sink: Arc<dyn SignalSink>) {
        self.emitter.connect(sink);
    }
}

/// Converts external payloads into internal signals
#[async_trait]
pub trait Ingestible: Send + Sync {
    /// The boundary's shared core
    fn core(&self) -> &IngestionCore;

    /// Derive and emit zero or more signals from a freshly recorded payload.
    ///
    /// Schema validation, if any, happens here.
    async fn on_ingest(&self, source: &str, data: &DataPacket) -> Result<(), CoreError>;

    /// Emission call-out; routes to the connected sink by default
    fn on_emit(&self, signal: Signal) {
        self.core().emitter().emit(signal);
    }

    /// Record `data` as the latest payload of `source`, then run `on_ingest`
    async fn ingest(&self, source: &str, data: DataPacket) -> Result<(), CoreError> {
        let core = self.core();
        debug!(boundary = %core.name(), source = %source, "Ingesting payload");
        core.record(source, data.clone());
        self.on_ingest(source, &data).await
    }

    /// Last payload ingested from `source`
    fn feed(&self, source: &str) -> Option<DataPacket> {
        self.core().feed(source)
    }

    /// Emit a signal through `on_emit`
    fn emit(&self, signal: Signal) {
        self.on_emit(signal);
    }
}
