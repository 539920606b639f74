//!
//! Trellis Core - composition layer for supervised automation pipelines
//!
//! This crate defines the data model, the error taxonomy and the six
//! building blocks every pipeline is assembled from: reactive services,
//! task executors, ingestion boundaries, the state store interface, the
//! health supervisor and the flow orchestrator with its signal bus.
//! State store backends and concrete pipelines live in other crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - the building blocks and their protocols
pub mod domain;

/// Core types
pub mod types;

/// Error types
pub mod error;

/// Configuration structs
pub mod config;

pub use config::{StoreConfig, SupervisorConfig};
pub use error::CoreError;
pub use types::{DataPacket, Event, Signal, SignalKind};

pub use domain::commitment::{
    transition_missing, Commitment, CommitmentState, TransitionMode, TransitionOutcome,
};
pub use domain::executor::{consume, consume_as, Executable};
pub use domain::ingestion::{Ingestible, IngestionCore};
pub use domain::orchestrator::{Flow, FlowBody, FlowOrchestrator, FlowOutcome};
pub use domain::policy::Policy;
pub use domain::registry::OrderedRegistry;
pub use domain::service::{EventHandler, Monitorable, ServiceCore, ServiceKind, Startable};
pub use domain::signal_bus::{Emitter, SignalBus, SignalSink};
pub use domain::state_store::{StateEntry, StateStore, StateStoreExt};
pub use domain::supervisor::{
    Escalation, EscalationSink, FailureHandler, HealthSupervisor, LogEscalation, RetryPolicy,
};
