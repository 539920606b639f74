//! Procurement executor
//!
//! Orders enough to cover the forecast plus 20% safety stock, less what is
//! on hand, and records the order as a committed commitment.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use trellis_core::{CoreError, Executable, Monitorable, ServiceKind, StateStore};

use crate::model::{DemandForecast, LeadTimes, PurchaseOrder, ReorderSignal};
use crate::sections;

/// Safety stock as a share of the forecast
pub const SAFETY_STOCK_RATIO: f64 = 0.2;

/// Lead time used when no `LeadTimes` signal is available
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 7;

/// Flat unit price
pub const UNIT_COST: f64 = 10.0;

/// Supplier used when no `LeadTimes` signal names one
pub const DEFAULT_SUPPLIER: &str = "SUPPLIER_001";

/// Signals consumed by procurement, keyed by signal type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcurementInput {
    /// Latest reorder signal
    #[serde(rename = "ReorderSignal", default)]
    pub reorder: Option<ReorderSignal>,

    /// Latest demand forecast
    #[serde(rename = "DemandForecast", default)]
    pub demand: Option<DemandForecast>,

    /// Latest supplier lead time
    #[serde(rename = "LeadTimes", default)]
    pub lead_times: Option<LeadTimes>,
}

/// Units to order: `max(0, ceil(forecast × 1.2 − level))`
pub fn order_quantity(current_level: f64, forecast: f64) -> u64 {
    let needed = (forecast * (1.0 + SAFETY_STOCK_RATIO) - current_level).ceil();
    if needed.is_finite() && needed > 0.0 {
        needed as u64
    } else {
        0
    }
}

/// Turns reorder, demand and lead-time signals into a purchase order
pub struct ProcurementExecutor {
    commitments: Arc<dyn StateStore>,
}

impl ProcurementExecutor {
    /// Executor name
    pub const NAME: &'static str = "ProcurementExecutor";

    /// Create an executor committing to `store`'s `Commitments` section
    pub fn new(store: &dyn StateStore) -> Self {
        Self {
            commitments: store.subsection(sections::COMMITMENTS),
        }
    }
}

#[async_trait]
impl Executable for ProcurementExecutor {
    type Input = ProcurementInput;
    type Output = PurchaseOrder;

    fn executor_name(&self) -> &str {
        Self::NAME
    }

    async fn process(&self, input: ProcurementInput) -> Result<PurchaseOrder, CoreError> {
        let current_level = input.reorder.as_ref().map_or(0.0, |r| r.current_level);
        let forecast = input.demand.as_ref().map_or(0.0, |d| d.forecast);
        let quantity = order_quantity(current_level, forecast);

        let (supplier_id, lead_time) = match input.lead_times {
            Some(lead) => (lead.supplier_id, lead.lead_time),
            None => (DEFAULT_SUPPLIER.to_string(), DEFAULT_LEAD_TIME_DAYS),
        };

        Ok(PurchaseOrder {
            order_id: format!("PO-{}", Uuid::new_v4()),
            sku: input
                .reorder
                .map(|r| r.sku)
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            quantity,
            supplier_id,
            expected_delivery: Utc::now() + Duration::days(i64::from(lead_time)),
            total_cost: quantity as f64 * UNIT_COST,
        })
    }

    async fn commit(&self, order: &PurchaseOrder) -> Result<(), CoreError> {
        let commitment = self
            .commitments
            .create_commitment(&order.order_id, serde_json::to_value(order)?)
            .await?;
        self.commitments.commit_commitment(&commitment.id).await?;
        Ok(())
    }
}

impl Monitorable for ProcurementExecutor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{CommitmentState, TransitionMode};
    use trellis_test_utils::test_store;

    fn input() -> ProcurementInput {
        ProcurementInput {
            reorder: Some(ReorderSignal {
                sku: "W-1".to_string(),
                current_level: 20.0,
                threshold: 50.0,
            }),
            demand: Some(DemandForecast {
                sku: "W-1".to_string(),
                forecast: 77.0,
                velocity: 10.0,
                period: 7.0,
            }),
            lead_times: Some(LeadTimes {
                supplier_id: "SUP-9".to_string(),
                lead_time: 3,
            }),
        }
    }

    #[test]
    fn test_order_quantity_covers_forecast_and_safety_stock() {
        // 77 * 1.2 = 92.4, minus 20 on hand
        assert_eq!(order_quantity(20.0, 77.0), 73);
        assert_eq!(order_quantity(100.0, 10.0), 0);
        assert_eq!(order_quantity(0.0, 0.0), 0);
    }

    #[tokio::test]
    async fn test_execute_commits_purchase_order() {
        let store = test_store(TransitionMode::Strict);
        let executor = ProcurementExecutor::new(store.as_ref());

        let order = executor.execute(input()).await.unwrap();
        assert!(order.order_id.starts_with("PO-"));
        assert_eq!(order.sku, "W-1");
        assert_eq!(order.quantity, 73);
        assert_eq!(order.total_cost, 730.0);
        assert_eq!(order.supplier_id, "SUP-9");

        let commitment = store
            .subsection(sections::COMMITMENTS)
            .commitment(&order.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commitment.state, CommitmentState::Committed);
        assert_eq!(commitment.data["quantity"], 73);
    }

    #[tokio::test]
    async fn test_missing_signals_fall_back_to_defaults() {
        let store = test_store(TransitionMode::Lenient);
        let executor = ProcurementExecutor::new(store.as_ref());

        let order = executor.process(ProcurementInput::default()).await.unwrap();
        assert_eq!(order.sku, "UNKNOWN");
        assert_eq!(order.quantity, 0);
        assert_eq!(order.supplier_id, DEFAULT_SUPPLIER);

        let days = (order.expected_delivery - Utc::now()).num_hours();
        assert!((6 * 24..=7 * 24).contains(&days));
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let store = test_store(TransitionMode::Lenient);
        let executor = ProcurementExecutor::new(store.as_ref());

        let a = executor.execute(input()).await.unwrap();
        let b = executor.execute(input()).await.unwrap();
        assert_ne!(a.order_id, b.order_id);
        assert_eq!(
            store.subsection(sections::COMMITMENTS).commitments().await.unwrap().len(),
            2
        );
    }
}
