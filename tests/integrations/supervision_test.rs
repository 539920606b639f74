//! Failure pipeline of the operations supervisor: retry with backoff,
//! failure handlers, quarantine, escalation.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use trellis_core::{Escalation, Monitorable, SupervisorConfig, TransitionMode};
use trellis_supply::services::{
    DemandService, InventoryService, LogisticsExecutor, OperationsSupervisor, ProcurementExecutor,
    SettlementExecutor,
};
use trellis_test_utils::mocks::create_mock_escalation_sink;
use trellis_test_utils::{init_test_tracing, test_store, FlakyOperation, MockEscalationSink};

fn monitored_supervisor(
    escalation: MockEscalationSink,
) -> (OperationsSupervisor, Arc<dyn Monitorable>) {
    let store = test_store(TransitionMode::Strict);
    let supervisor =
        OperationsSupervisor::new(&SupervisorConfig::default()).with_escalation(Arc::new(escalation));
    let logistics = Arc::new(LogisticsExecutor::new(store.as_ref()));
    let logistics_service: Arc<dyn Monitorable> = logistics.clone();
    supervisor.setup_monitoring(
        Arc::new(InventoryService::new(store.as_ref())),
        Arc::new(DemandService::new(store.as_ref())),
        Arc::new(ProcurementExecutor::new(store.as_ref())),
        logistics,
        Arc::new(SettlementExecutor::new(store.as_ref())),
    );
    (supervisor, logistics_service)
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_recovers_without_escalation() {
    init_test_tracing();
    let (supervisor, logistics) = monitored_supervisor(create_mock_escalation_sink(0));
    let operation = FlakyOperation::failing(2);

    let started = tokio::time::Instant::now();
    let value = supervisor
        .run_supervised(logistics.clone(), || operation.call())
        .await
        .unwrap();

    assert_eq!(value, 3);
    assert_eq!(operation.calls(), 3);
    // 2s after attempt 1, 4s after attempt 2
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert!(supervisor.is_monitored(&logistics));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_quarantines_and_escalates_once() {
    let mut escalation = MockEscalationSink::new();
    escalation
        .expect_escalate()
        .withf(|e: &Escalation| {
            e.supervisor == "OperationsSupervisor"
                && e.issue == "Service failure after retries"
                && e.context["service"] == "LogisticsExecutor"
                && e.context["error"] == "Operation error: attempt 3 failed"
        })
        .times(1)
        .returning(|_| Ok(()));
    let (supervisor, logistics) = monitored_supervisor(escalation);
    let operation = FlakyOperation::always_failing();

    let err = supervisor
        .run_supervised(logistics.clone(), || operation.call())
        .await
        .unwrap_err();

    assert_eq!(err, FlakyOperation::error_for(3));
    assert!(!supervisor.is_monitored(&logistics));

    let remaining: Vec<String> = supervisor
        .monitored()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(
        remaining,
        vec![
            "InventoryService",
            "DemandService",
            "ProcurementExecutor",
            "SettlementExecutor",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_escalation_keeps_original_error() {
    let mut escalation = MockEscalationSink::new();
    escalation
        .expect_escalate()
        .times(1)
        .returning(|_| Err("authority offline".into()));
    let (supervisor, logistics) = monitored_supervisor(escalation);
    let operation = FlakyOperation::always_failing();

    let err = supervisor
        .run_supervised(logistics, || operation.call())
        .await
        .unwrap_err();
    assert_eq!(err, FlakyOperation::error_for(3));
}
