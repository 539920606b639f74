//! Testing utilities for Trellis pipelines.
//!
//! This crate provides mocks of the core seams (signal sinks and escalation
//! sinks), recording fakes, a scripted flaky operation for retry tests,
//! and environment setup helpers.

pub mod implementations;
pub mod mocks;
pub mod util;

/// Re-export commonly used types for convenience
pub use mockall;

pub use implementations::{FlakyOperation, RecordingEscalation, RecordingSink};
pub use mocks::{MockEscalationSink, MockSignalSink};
pub use util::{init_test_tracing, test_store};
