//! Logistics executor

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use trellis_core::{CoreError, Executable, Monitorable, ServiceKind, StateStore, StateStoreExt};

use crate::model::{Capacity, PurchaseOrder, ShipmentPlan};
use crate::sections;

/// Carrier assigned to every shipment
pub const DEFAULT_CARRIER: &str = "CARRIER_A";

/// Order to ship plus the latest supplier capacity, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsInput {
    /// Order to ship
    #[serde(rename = "PurchaseOrder")]
    pub purchase_order: PurchaseOrder,

    /// Latest supplier capacity
    #[serde(rename = "Capacity", default)]
    pub capacity: Option<Capacity>,
}

/// Plans shipments for purchase orders
pub struct LogisticsExecutor {
    logistics: Arc<dyn StateStore>,
}

impl LogisticsExecutor {
    /// Executor name
    pub const NAME: &'static str = "LogisticsExecutor";

    /// Create an executor writing to `store`'s `Logistics` section
    pub fn new(store: &dyn StateStore) -> Self {
        Self {
            logistics: store.subsection(sections::LOGISTICS),
        }
    }
}

#[async_trait]
impl Executable for LogisticsExecutor {
    type Input = LogisticsInput;
    type Output = ShipmentPlan;

    fn executor_name(&self) -> &str {
        Self::NAME
    }

    async fn process(&self, input: LogisticsInput) -> Result<ShipmentPlan, CoreError> {
        let order = input.purchase_order;
        Ok(ShipmentPlan {
            shipment_id: format!("SH-{}", Uuid::new_v4()),
            order_id: order.order_id,
            route: ["Origin", "Hub", "Destination"]
                .iter()
                .map(|stop| stop.to_string())
                .collect(),
            estimated_arrival: order.expected_delivery,
            carrier: DEFAULT_CARRIER.to_string(),
            tracking_number: format!("TRK-{}", Uuid::new_v4()),
        })
    }

    async fn commit(&self, plan: &ShipmentPlan) -> Result<(), CoreError> {
        self.logistics.write_json(&plan.shipment_id, plan).await
    }
}

impl Monitorable for LogisticsExecutor {
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
    use chrono::Utc;
    use trellis_core::TransitionMode;
    use trellis_test_utils::test_store;

    #[tokio::test]
    async fn test_shipment_plan_written_to_logistics() {
        let store = test_store(TransitionMode::Lenient);
        let executor = LogisticsExecutor::new(store.as_ref());
        let order = PurchaseOrder {
            order_id: "PO-1".to_string(),
            sku: "W-1".to_string(),
            quantity: 10,
            supplier_id: "SUP-1".to_string(),
            expected_delivery: Utc::now(),
            total_cost: 100.0,
        };

        let plan = executor
            .execute(LogisticsInput {
                purchase_order: order.clone(),
                capacity: None,
            })
            .await
            .unwrap();

        assert!(plan.shipment_id.starts_with("SH-"));
        assert!(plan.tracking_number.starts_with("TRK-"));
        assert_eq!(plan.route, vec!["Origin", "Hub", "Destination"]);
        assert_eq!(plan.carrier, "CARRIER_A");
        assert_eq!(plan.estimated_arrival, order.expected_delivery);

        let stored: ShipmentPlan = store
            .subsection(sections::LOGISTICS)
            .read_json(&plan.shipment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, plan);
    }
}
