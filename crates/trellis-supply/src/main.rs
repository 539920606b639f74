use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use trellis_core::{DataPacket, Event, Ingestible, Signal, StateStore, Startable};
use trellis_supply::model::{events, sources, DeliveryProof, PurchaseOrder};
use trellis_supply::{assemble, flows, sections, PipelineConfig, SupplyChainSystem};

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let (config, rejected) = PipelineConfig::load_deferred(path.as_deref())
        .context("Failed to load configuration")?;

    trellis_monitoring::init_logging(&config.monitoring)
        .context("Failed to initialize logging")?;
    if let Some(path) = &path {
        info!(path = %path.display(), "Loaded pipeline configuration");
    }
    for invalid in &rejected {
        invalid.report();
    }

    let system = assemble(&config);
    system.start().await.context("Failed to start services")?;

    let round = run_round(&system).await;
    system.stop().await.context("Failed to stop services")?;
    round
}

/// Drive one replenishment, settlement and adaptation round
async fn run_round(system: &SupplyChainSystem) -> Result<()> {
    let outcome = system.flow.execute_flow(flows::REPLENISHMENT).await?;
    info!(outcome = ?outcome, "Replenishment before any signal");

    system
        .inventory
        .deliver(Event::new(
            events::STOCK_LEVEL_CHANGE,
            json!({"sku": "WIDGET-1", "level": 20.0, "threshold": 50.0}),
            "warehouse",
        ))
        .await?;
    system
        .demand
        .deliver(Event::new(
            events::SALES_VELOCITY,
            json!({"sku": "WIDGET-1", "velocity": 10.0, "period": 7.0}),
            "pos",
        ))
        .await?;
    system
        .supplier
        .ingest(
            sources::SUPPLIER_FEED,
            DataPacket::new(json!({
                "supplier_id": "SUPPLIER_042",
                "pricing": {"WIDGET-1": 10.0},
                "capacity": {"WIDGET-1": 500},
            })),
        )
        .await?;
    system
        .supplier
        .ingest(
            sources::LOGISTICS_API,
            DataPacket::new(json!({"supplier_id": "SUPPLIER_042", "lead_time": 5})),
        )
        .await?;

    let outcome = system.flow.execute_flow(flows::REPLENISHMENT).await?;
    info!(outcome = ?outcome, "Replenishment after signals");

    if let Some(order) = system.flow.bus().latest_as::<PurchaseOrder>()? {
        system.flow.store_signal(Signal::from_kind(&DeliveryProof {
            order_id: order.order_id,
            amount: order.total_cost,
            supplier_id: order.supplier_id,
        })?);
        system.flow.execute_flow(flows::SETTLEMENT).await?;
    }

    system
        .governance
        .deliver(Event::new(
            events::PROPOSAL_EVENT,
            json!({
                "proposal_id": "PROP-1",
                "policy": {"safety_stock": 0.25},
                "votes": {"for": 7, "against": 2},
            }),
            "dao",
        ))
        .await?;
    system.flow.execute_flow(flows::ADAPTATION).await?;

    let commitments = system
        .store
        .subsection(sections::COMMITMENTS)
        .commitments()
        .await?;
    info!(
        commitments = commitments.len(),
        policy = ?system.flow.active_policy().map(|p| p.id),
        "Round finished"
    );
    Ok(())
}
