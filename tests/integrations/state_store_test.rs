//! Shared store behaviour seen through `Arc<dyn StateStore>` by several
//! services at once.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use trellis_core::{
    CommitmentState, Signal, Startable, StateStore, TransitionMode, TransitionOutcome,
};
use trellis_state_inmemory::InMemoryStateStore;
use trellis_supply::services::{DemandService, InventoryService};
use trellis_supply::sections;
use trellis_test_utils::mockall::predicate::function;
use trellis_test_utils::{test_store, MockSignalSink, RecordingSink};
use trellis_tests::utils::{stock_event, velocity_event};

#[tokio::test]
async fn test_services_write_to_their_own_sections() {
    let store = test_store(TransitionMode::Lenient);
    let inventory = InventoryService::new(store.as_ref());
    let demand = DemandService::new(store.as_ref());
    inventory.start().await.unwrap();
    demand.start().await.unwrap();

    inventory.deliver(stock_event("W-1", 200.0, 50.0)).await.unwrap();
    demand.deliver(velocity_event("W-1", 2.0, 10.0)).await.unwrap();

    let inventory_keys: Vec<String> = store
        .subsection(sections::INVENTORY)
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.key)
        .collect();
    assert_eq!(inventory_keys, vec!["W-1"]);

    let forecast = store
        .subsection(sections::FORECASTS)
        .read("W-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forecast["forecast"], json!(22.0));

    assert!(store.get_all().await.unwrap().is_empty());
    assert_eq!(store.subsection_names(), vec!["Forecasts", "Inventory"]);
}

#[tokio::test]
async fn test_overstock_emits_once_through_mock_sink() {
    let store = test_store(TransitionMode::Lenient);
    let inventory = InventoryService::new(store.as_ref());

    let mut sink = MockSignalSink::new();
    sink.expect_accept()
        .with(function(|s: &Signal| {
            s.signal_type == "OverstockSignal" && s.data.get("sku") == Some(&json!("W-1"))
        }))
        .times(1)
        .returning(|_| ());
    inventory.core().connect(Arc::new(sink));
    inventory.start().await.unwrap();

    inventory.deliver(stock_event("W-1", 151.0, 50.0)).await.unwrap();
    // within band: nothing emitted
    inventory.deliver(stock_event("W-1", 100.0, 50.0)).await.unwrap();
}

#[tokio::test]
async fn test_restart_does_not_duplicate_emissions() {
    let store = test_store(TransitionMode::Lenient);
    let inventory = InventoryService::new(store.as_ref());
    let sink = Arc::new(RecordingSink::new());
    inventory.core().connect(sink.clone());

    inventory.start().await.unwrap();
    inventory.stop().await.unwrap();
    inventory.start().await.unwrap();

    inventory.deliver(stock_event("W-1", 1.0, 50.0)).await.unwrap();
    assert_eq!(sink.types(), vec!["ReorderSignal"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_commitment_finalises_once_across_handles() {
    let root: Arc<dyn StateStore> =
        Arc::new(InMemoryStateStore::with_mode("root", TransitionMode::Strict));
    let commitments = root.subsection(sections::COMMITMENTS);
    commitments.create_commitment("PO-race", json!({"qty": 1})).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..8 {
        let handle = root.subsection(sections::COMMITMENTS);
        handles.push(tokio::spawn(async move {
            if n % 2 == 0 {
                handle.commit_commitment("PO-race").await
            } else {
                handle.fail_commitment("PO-race").await
            }
        }));
    }

    let mut applied = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(TransitionOutcome::Applied) => applied += 1,
            Ok(TransitionOutcome::Ignored) => panic!("strict store ignored a transition"),
            Err(_) => rejected += 1,
        }
    }
    assert_eq!((applied, rejected), (1, 7));

    let state = commitments.commitment("PO-race").await.unwrap().unwrap().state;
    assert!(matches!(state, CommitmentState::Committed | CommitmentState::Failed));
}
