//! Mock implementation of the EscalationSink trait.

use async_trait::async_trait;
use mockall::mock;
use trellis_core::{CoreError, Escalation, EscalationSink};

mock! {
    pub EscalationSink {}

    #[async_trait]
    impl EscalationSink for EscalationSink {
        async fn escalate(&self, escalation: Escalation) -> Result<(), CoreError>;
    }
}

/// Creates a mock EscalationSink that expects exactly `times` escalations.
pub fn create_mock_escalation_sink(times: usize) -> MockEscalationSink {
    let mut mock = MockEscalationSink::new();
    mock.expect_escalate().times(times).returning(|_| Ok(()));
    mock
}
