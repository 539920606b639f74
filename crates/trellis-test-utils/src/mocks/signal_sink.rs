//! Mock implementation of the SignalSink trait.

use mockall::mock;
use trellis_core::{Signal, SignalSink};

mock! {
    pub SignalSink {}

    impl SignalSink for SignalSink {
        fn accept(&self, signal: Signal);
    }
}

/// Creates a mock SignalSink that accepts any signal.
pub fn create_permissive_signal_sink() -> MockSignalSink {
    let mut mock = MockSignalSink::new();
    mock.expect_accept().returning(|_| ());
    mock
}
