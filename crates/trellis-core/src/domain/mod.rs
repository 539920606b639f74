/// Commitment records and transition rules
pub mod commitment;

/// Hierarchical state store interface
pub mod state_store;

/// Governance policy records
pub mod policy;

/// Insertion-ordered registries
pub mod registry;

/// Signal bus and emission routing
pub mod signal_bus;

/// Event-reactive services
pub mod service;

/// One-shot task executors
pub mod executor;

/// External ingestion boundaries
pub mod ingestion;

/// Health supervision
pub mod supervisor;

/// Flow orchestration
pub mod orchestrator;
