//! Stock level watcher
//!
//! Emits `ReorderSignal` below threshold and `OverstockSignal` above three
//! times the threshold, and keeps the latest level per SKU in `Inventory`.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use trellis_core::{
    CoreError, Event, Monitorable, ServiceCore, ServiceKind, Startable, StateStore,
};

use crate::model::{events, stamped, OverstockSignal, ReorderSignal, SkuEvent, StockLevelChange};
use crate::sections;

/// Reactive service watching stock levels and SKU events
pub struct InventoryService {
    core: ServiceCore,
    inventory: Arc<dyn StateStore>,
}

impl InventoryService {
    /// Service name
    pub const NAME: &'static str = "InventoryService";

    /// Create a stopped service writing to `store`'s `Inventory` section
    pub fn new(store: &dyn StateStore) -> Self {
        Self {
            core: ServiceCore::new(Self::NAME),
            inventory: store.subsection(sections::INVENTORY),
        }
    }
}

#[async_trait]
impl Startable for InventoryService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    async fn on_start(&self) -> Result<(), CoreError> {
        let emitter = self.core.emitter();
        let inventory = self.inventory.clone();
        self.core.watch(events::STOCK_LEVEL_CHANGE, move |event: Event| {
            let emitter = emitter.clone();
            let inventory = inventory.clone();
            async move {
                let change: StockLevelChange = event.payload_as()?;

                if change.level < change.threshold {
                    emitter.emit(stamped(
                        &ReorderSignal {
                            sku: change.sku.clone(),
                            current_level: change.level,
                            threshold: change.threshold,
                        },
                        InventoryService::NAME,
                    )?);
                }

                if change.level > change.threshold * 3.0 {
                    emitter.emit(stamped(
                        &OverstockSignal {
                            sku: change.sku.clone(),
                            current_level: change.level,
                            threshold: change.threshold,
                        },
                        InventoryService::NAME,
                    )?);
                }

                inventory
                    .write(
                        &change.sku,
                        json!({
                            "level": change.level,
                            "threshold": change.threshold,
                            "last_update": Utc::now().timestamp_millis(),
                        }),
                    )
                    .await
            }
        });

        let inventory = self.inventory.clone();
        self.core.watch(events::SKU_EVENT, move |event: Event| {
            let inventory = inventory.clone();
            async move {
                let sku_event: SkuEvent = event.payload_as()?;
                debug!(sku = %sku_event.sku, event_type = %sku_event.event_type, "Recording SKU event");
                inventory
                    .write(
                        &format!("{}_events", sku_event.sku),
                        json!({
                            "event_type": sku_event.event_type,
                            "data": sku_event.data,
                            "timestamp": Utc::now().timestamp_millis(),
                        }),
                    )
                    .await
            }
        });

        Ok(())
    }
}

impl Monitorable for InventoryService {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Reactive
    }

    fn running(&self) -> Option<bool> {
        Some(self.core.is_running())
    }
}
