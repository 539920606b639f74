//! End-to-end replenishment, settlement and adaptation through the
//! assembled supply-chain pipeline.

use pretty_assertions::assert_eq;
use serde_json::json;

use trellis_core::{
    CommitmentState, CoreError, DataPacket, Event, FlowOutcome, Ingestible, Signal, StateStore,
    Startable,
};
use trellis_supply::model::{
    events, sources, Capacity, DeliveryProof, PurchaseOrder, ShipmentPlan,
};
use trellis_supply::{flows, sections};
use trellis_test_utils::init_test_tracing;
use trellis_tests::utils::{lead_time_feed, stock_event, strict_system, velocity_event};

#[tokio::test]
async fn test_replenishment_round_commits_purchase_order() -> anyhow::Result<()> {
    init_test_tracing();
    let system = strict_system();
    system.start().await?;

    let outcome = system.flow.execute_flow(flows::REPLENISHMENT).await?;
    assert_eq!(
        outcome,
        FlowOutcome::Deferred {
            missing: vec![
                "ReorderSignal".to_string(),
                "DemandForecast".to_string(),
                "LeadTimes".to_string(),
            ]
        }
    );
    let commitments = system.store.subsection(sections::COMMITMENTS);
    assert!(commitments.commitments().await?.is_empty());

    system.inventory.deliver(stock_event("W-1", 20.0, 50.0)).await?;
    system.demand.deliver(velocity_event("W-1", 10.0, 7.0)).await?;
    system
        .supplier
        .ingest(sources::LOGISTICS_API, lead_time_feed("SUP-9", 3))
        .await?;

    let outcome = system.flow.execute_flow(flows::REPLENISHMENT).await?;
    assert_eq!(outcome, FlowOutcome::Completed);

    let recorded = commitments.commitments().await?;
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].id.starts_with("PO-"));
    assert_eq!(recorded[0].state, CommitmentState::Committed);
    assert_eq!(recorded[0].data["sku"], "W-1");
    assert_eq!(recorded[0].data["quantity"], 73);
    assert_eq!(recorded[0].data["supplier_id"], "SUP-9");

    let order: PurchaseOrder = system.flow.bus().latest_as()?.expect("order on bus");
    let plan: ShipmentPlan = system.flow.bus().latest_as()?.expect("plan on bus");
    assert_eq!(order.order_id, recorded[0].id);
    assert_eq!(plan.order_id, order.order_id);

    let inventory = system.store.subsection(sections::INVENTORY);
    assert_eq!(inventory.read("W-1").await?.map(|v| v["level"].clone()), Some(json!(20.0)));
    let forecasts = system.store.subsection(sections::FORECASTS);
    assert!(forecasts.read("W-1").await?.is_some());

    system.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_supplier_feed_capacity_reaches_logistics() -> anyhow::Result<()> {
    let system = strict_system();
    system.start().await?;

    system
        .supplier
        .ingest(
            sources::SUPPLIER_FEED,
            DataPacket::new(json!({
                "supplier_id": "SUP-9",
                "pricing": {"W-1": 9.5},
                "capacity": {"W-1": 400},
            })),
        )
        .await?;

    let capacity: Capacity = system.flow.bus().latest_as()?.expect("capacity on bus");
    assert_eq!(capacity.capacity, json!({"W-1": 400}));
    assert!(system.flow.get_signal("Pricing").is_some());
    assert_eq!(
        system.supplier.feed(sources::SUPPLIER_FEED).map(|d| d.into_value()["supplier_id"].clone()),
        Some(json!("SUP-9"))
    );

    let err = system
        .supplier
        .ingest(sources::SUPPLIER_FEED, DataPacket::new(json!({"supplier_id": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    system.supplier.ingest("Weather", DataPacket::new(json!({"rain": true}))).await?;
    assert!(system.flow.get_signal("Weather").is_none());
    assert!(system.supplier.feed("Weather").is_some());

    system.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_delivery_proof_settles_into_financials() -> anyhow::Result<()> {
    let system = strict_system();

    assert!(matches!(
        system.flow.execute_flow(flows::SETTLEMENT).await?,
        FlowOutcome::Deferred { .. }
    ));

    system.flow.store_signal(Signal::from_kind(&DeliveryProof {
        order_id: "PO-1".to_string(),
        amount: 730.0,
        supplier_id: "SUP-9".to_string(),
    })?);
    assert!(system.flow.execute_flow(flows::SETTLEMENT).await?.is_completed());

    let payments = system.store.subsection(sections::FINANCIALS).get_all().await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].value["recipient"], "SUP-9");
    assert_eq!(payments[0].value["method"], "CRYPTO_TRANSFER");
    Ok(())
}

#[tokio::test]
async fn test_passed_proposal_is_hot_swapped() -> anyhow::Result<()> {
    let system = strict_system();
    system.start().await?;

    let proposal = |id: &str, votes_for: u64, against: u64| {
        Event::new(
            events::PROPOSAL_EVENT,
            json!({
                "proposal_id": id,
                "policy": {"safety_stock": 0.3},
                "votes": {"for": votes_for, "against": against},
            }),
            "dao",
        )
    };

    system.governance.deliver(proposal("P-rejected", 1, 4)).await?;
    assert!(matches!(
        system.flow.execute_flow(flows::ADAPTATION).await?,
        FlowOutcome::Deferred { .. }
    ));

    system.governance.deliver(proposal("P-accepted", 4, 1)).await?;
    assert!(system.flow.execute_flow(flows::ADAPTATION).await?.is_completed());

    let policy = system.flow.active_policy().expect("policy installed");
    assert_eq!(policy.id, "P-accepted");
    assert_eq!(policy.authority, "DAO.TokenWeighted");
    assert_eq!(policy.rules["safety_stock"], json!(0.3));

    system.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_stopped_services_reject_events() -> anyhow::Result<()> {
    let system = strict_system();
    system.start().await?;
    system.stop().await?;

    let err = system
        .inventory
        .deliver(stock_event("W-1", 1.0, 10.0))
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::ServiceNotRunning("InventoryService".to_string()));
    assert!(system.flow.get_signal("ReorderSignal").is_none());
    Ok(())
}
