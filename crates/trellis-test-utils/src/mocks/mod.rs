//! Mock implementations of the core routing seams.
//!
//! These let a test set expectations on what a service emits or what a
//! supervisor escalates without wiring a real bus.

pub mod escalation;
pub mod signal_sink;

// Re-export all mocks and their creator functions for easy access
pub use escalation::*;
pub use signal_sink::*;
