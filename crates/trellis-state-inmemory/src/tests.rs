use crate::InMemoryStateStore;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_test::block_on;
use trellis_core::{
    CommitmentState, CoreError, StateStore, StateStoreExt, StoreConfig, TransitionMode,
    TransitionOutcome,
};

#[tokio::test]
async fn test_overwrite_keeps_one_entry_per_key() -> Result<(), CoreError> {
    let store = InMemoryStateStore::new("root");

    store.write("k", json!("v1")).await?;
    store.write("k", json!("v2")).await?;
    store.write("other", json!(1)).await?;

    assert_eq!(store.read("k").await?, Some(json!("v2")));
    assert_eq!(store.read("missing").await?, None);

    let all = store.get_all().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|e| e.key == "k").count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_write_signed_records_signature() -> Result<(), CoreError> {
    let store = InMemoryStateStore::new("root");
    store
        .write_signed("po", json!({"qty": 4}), Some("sig-1".to_string()))
        .await?;
    store.write("plain", json!(null)).await?;

    let all = store.get_all().await?;
    assert_eq!(all[0].key, "plain");
    assert_eq!(all[0].signature, None);
    assert_eq!(all[1].signature.as_deref(), Some("sig-1"));

    Ok(())
}

#[tokio::test]
async fn test_commitment_lifecycle_is_lenient_by_default() -> Result<(), CoreError> {
    let store = InMemoryStateStore::new("root");
    assert_eq!(store.transition_mode(), TransitionMode::Lenient);

    let created = store.create_commitment("c1", json!({"order": "PO-1"})).await?;
    assert_eq!(created.state, CommitmentState::Pending);

    assert_eq!(store.commit_commitment("c1").await?, TransitionOutcome::Applied);
    assert_eq!(store.fail_commitment("c1").await?, TransitionOutcome::Ignored);
    assert_eq!(store.commit_commitment("c1").await?, TransitionOutcome::Ignored);
    assert_eq!(
        store.commitment("c1").await?.map(|c| c.state),
        Some(CommitmentState::Committed)
    );

    store.create_commitment("c2", json!(null)).await?;
    store.fail_commitment("c2").await?;
    assert_eq!(store.commit_commitment("c2").await?, TransitionOutcome::Ignored);
    assert_eq!(
        store.commitment("c2").await?.map(|c| c.state),
        Some(CommitmentState::Failed)
    );

    assert_eq!(store.commit_commitment("nope").await?, TransitionOutcome::Ignored);
    Ok(())
}

#[tokio::test]
async fn test_strict_mode_rejects_invalid_transitions() -> Result<(), CoreError> {
    let store = InMemoryStateStore::with_mode("root", TransitionMode::Strict);
    store.create_commitment("c1", json!(1)).await?;
    store.commit_commitment("c1").await?;

    let err = store.fail_commitment("c1").await.unwrap_err();
    assert_eq!(
        err,
        CoreError::InvalidTransition {
            id: "c1".to_string(),
            from: CommitmentState::Committed,
            to: CommitmentState::Failed,
        }
    );

    let err = store.commit_commitment("ghost").await.unwrap_err();
    assert_eq!(err, CoreError::CommitmentNotFound("ghost".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_recreating_commitment_resets_to_pending() -> Result<(), CoreError> {
    let store = InMemoryStateStore::new("root");
    store.create_commitment("c1", json!("first")).await?;
    store.commit_commitment("c1").await?;

    store.create_commitment("c1", json!("second")).await?;
    let c1 = store.commitment("c1").await?.expect("commitment exists");
    assert_eq!(c1.state, CommitmentState::Pending);
    assert_eq!(c1.data, json!("second"));
    assert_eq!(store.commitments().await?.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finalisation_applies_exactly_once() {
    let store = Arc::new(InMemoryStateStore::new("root"));
    store.create_commitment("race", json!(null)).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if n % 2 == 0 {
                store.commit_commitment("race").await
            } else {
                store.fail_commitment("race").await
            }
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() == TransitionOutcome::Applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);
    assert!(store.commitment("race").await.unwrap().unwrap().state.is_terminal());
}

#[test]
fn test_subsection_identity_and_naming() {
    let store = InMemoryStateStore::new("root");

    let a = store.subsection_store("Inventory");
    let b = store.subsection_store("Inventory");
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.name(), "root.Inventory");

    let via_trait = store.subsection("Inventory");
    assert_eq!(Arc::as_ptr(&via_trait) as *const (), Arc::as_ptr(&a) as *const ());

    let nested = a.subsection("Warehouse");
    assert_eq!(nested.name(), "root.Inventory.Warehouse");
}

#[test]
fn test_subsections_are_independent() {
    let store = InMemoryStateStore::new("root");
    let inventory = store.subsection("Inventory");
    let forecasts = store.subsection("Forecasts");

    block_on(async {
        inventory.write("W-1", json!(5)).await.unwrap();
        assert_eq!(forecasts.read("W-1").await.unwrap(), None);
        assert_eq!(store.read("W-1").await.unwrap(), None);
        assert!(store.get_all().await.unwrap().is_empty());
    });

    assert_eq!(store.subsection_names(), vec!["Forecasts", "Inventory"]);
}

#[test]
fn test_subsections_inherit_mode_and_config_name() {
    let config = StoreConfig {
        root_name: "ledger".to_string(),
        transition_mode: TransitionMode::Strict,
    };
    let store = InMemoryStateStore::from_config(&config);
    let child = store.subsection("Commitments");

    assert_eq!(child.name(), "ledger.Commitments");
    assert_eq!(child.transition_mode(), TransitionMode::Strict);
    assert_eq!(InMemoryStateStore::default().name(), "root");
}

#[tokio::test]
async fn test_concurrent_first_subsection_calls_share_instance() {
    let store = Arc::new(InMemoryStateStore::new("root"));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.subsection_store("Logistics") }));
    }

    let first = store.subsection_store("Logistics");
    for handle in handles {
        assert!(Arc::ptr_eq(&handle.await.unwrap(), &first));
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Level {
    sku: String,
    level: u32,
}

#[tokio::test]
async fn test_typed_helpers_round_trip_through_subsection() -> Result<(), CoreError> {
    let store = InMemoryStateStore::new("root");
    let inventory = store.subsection("Inventory");

    let level = Level {
        sku: "W-1".to_string(),
        level: 12,
    };
    inventory.write_json("W-1", &level).await?;

    assert_eq!(inventory.read_json::<Level>("W-1").await?, Some(level));
    assert!(inventory.read_json::<u32>("W-1").await.is_err());
    Ok(())
}
