//! Blackboard of received signals
//!
//! The bus keeps the full history of every signal type and answers
//! "latest of type" reads for flow bodies.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

use super::registry::OrderedRegistry;
use crate::types::{Signal, SignalKind};
use crate::CoreError;

/// Destination for signals emitted by services and ingestion boundaries
pub trait SignalSink: Send + Sync {
    /// Accept one emitted signal
    fn accept(&self, signal: Signal);
}

/// Signal store shared by an orchestrator and the services feeding it
#[derive(Debug, Default)]
pub struct SignalBus {
    signals: RwLock<OrderedRegistry<Vec<Signal>>>,
}

impl SignalBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a signal to the history of its type
    pub fn store(&self, signal: Signal) {
        debug!(signal_type = %signal.signal_type, "Storing signal");
        let mut signals = self.signals.write();
        signals
            .get_or_insert_with(&signal.signal_type, Vec::new)
            .push(signal);
    }

    /// Most recent signal of `signal_type`
    pub fn latest(&self, signal_type: &str) -> Option<Signal> {
        self.signals
            .read()
            .get(signal_type)
            .and_then(|history| history.last().cloned())
    }

    /// Most recent signal of kind `K`, decoded
    pub fn latest_as<K: SignalKind>(&self) -> Result<Option<K>, CoreError> {
        self.latest(K::TYPE).map(|s| s.data_as::<K>()).transpose()
    }

    /// Every signal received for `signal_type`, oldest first
    pub fn history(&self, signal_type: &str) -> Vec<Signal> {
        self.signals
            .read()
            .get(signal_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Signal types seen so far, in first-arrival order
    pub fn types(&self) -> Vec<String> {
        self.signals.read().names().map(str::to_string).collect()
    }

    /// Latest signal of each requested type, or the types still missing
    pub fn require(&self, signal_types: &[&str]) -> Result<Vec<Signal>, Vec<String>> {
        let signals = self.signals.read();
        let mut found = Vec::with_capacity(signal_types.len());
        let mut missing = Vec::new();

        for signal_type in signal_types {
            match signals.get(signal_type).and_then(|h| h.last()) {
                Some(signal) => found.push(signal.clone()),
                None => missing.push(signal_type.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(found)
        } else {
            Err(missing)
        }
    }
}

impl SignalSink for SignalBus {
    fn accept(&self, signal: Signal) {
        self.store(signal);
    }
}

/// Cloneable handle that routes a component's emissions to its sink.
///
/// The sink can be connected or swapped after handlers have captured
/// the emitter; every clone sees the current connection.
#[derive(Clone)]
pub struct Emitter {
    source: String,
    sink: Arc<RwLock<Option<Arc<dyn SignalSink>>>>,
}

impl Emitter {
    /// Create a disconnected emitter for `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sink: Arc::new(RwLock::new(None)),
        }
    }

    /// Route future emissions to `sink`
    pub fn connect(&self, sink: Arc<dyn SignalSink>) {
        *self.sink.write() = Some(sink);
    }

    /// Drop the current sink
    pub fn disconnect(&self) {
        *self.sink.write() = None;
    }

    /// Whether a sink is connected
    pub fn is_connected(&self) -> bool {
        self.sink.read().is_some()
    }

    /// Send a signal to the connected sink, if any
    pub fn emit(&self, signal: Signal) {
        let sink = self.sink.read().clone();
        match sink {
            Some(sink) => {
                debug!(source = %self.source, signal_type = %signal.signal_type, "Emitting signal");
                sink.accept(signal);
            }
            None => {
                trace!(source = %self.source, signal_type = %signal.signal_type, "No sink connected, dropping signal");
            }
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("source", &self.source)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Reorder {
        sku: String,
    }

    impl SignalKind for Reorder {
        const TYPE: &'static str = "ReorderSignal";
    }

    #[test]
    fn test_latest_wins() {
        let bus = SignalBus::new();
        bus.store(Signal::new("A", json!(1)));
        bus.store(Signal::new("A", json!(2)));

        assert_eq!(bus.latest("A").unwrap().data.value, json!(2));
        assert!(bus.latest("B").is_none());
    }

    #[test]
    fn test_history_is_kept_in_arrival_order() {
        let bus = SignalBus::new();
        for n in 0..3 {
            bus.store(Signal::new("A", json!(n)));
        }
        bus.store(Signal::new("B", json!("b")));

        let values: Vec<_> = bus.history("A").into_iter().map(|s| s.data.value).collect();
        assert_eq!(values, vec![json!(0), json!(1), json!(2)]);
        assert_eq!(bus.types(), vec!["A".to_string(), "B".to_string()]);
        assert!(bus.history("C").is_empty());
    }

    #[test]
    fn test_require_reports_missing_types() {
        let bus = SignalBus::new();
        bus.store(Signal::new("R", json!({})));

        assert_eq!(
            bus.require(&["R", "D", "L"]).unwrap_err(),
            vec!["D".to_string(), "L".to_string()]
        );

        bus.store(Signal::new("D", json!({})));
        bus.store(Signal::new("L", json!({})));
        let found = bus.require(&["R", "D", "L"]).unwrap();
        assert_eq!(
            found.iter().map(|s| s.signal_type.as_str()).collect::<Vec<_>>(),
            vec!["R", "D", "L"]
        );
    }

    #[test]
    fn test_latest_as_decodes_kind() {
        let bus = SignalBus::new();
        assert_eq!(bus.latest_as::<Reorder>().unwrap(), None);

        bus.accept(Signal::new("ReorderSignal", json!({"sku": "W-1"})));
        assert_eq!(
            bus.latest_as::<Reorder>().unwrap(),
            Some(Reorder { sku: "W-1".to_string() })
        );

        bus.accept(Signal::new("ReorderSignal", json!({"unexpected": true})));
        assert!(bus.latest_as::<Reorder>().is_err());
    }

    #[test]
    fn test_emitter_clones_share_connection() {
        let bus = Arc::new(SignalBus::new());
        let emitter = Emitter::new("unit");
        let captured = emitter.clone();

        captured.emit(Signal::new("A", json!(0)));
        assert!(bus.latest("A").is_none());

        emitter.connect(bus.clone());
        captured.emit(Signal::new("A", json!(1)));
        assert_eq!(bus.latest("A").unwrap().data.value, json!(1));

        emitter.disconnect();
        assert!(!captured.is_connected());
    }
}
