//! Test implementations (fakes) of core seams.

pub mod flaky_operation;
pub mod recording;

pub use flaky_operation::FlakyOperation;
pub use recording::{RecordingEscalation, RecordingSink};
