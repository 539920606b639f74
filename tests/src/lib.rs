//! Trellis integration tests
//!
//! Shared fixtures for the scenarios under `integrations/`.

/// Utility functions shared by the integration scenarios
pub mod utils {
    use serde_json::json;
    use trellis_core::{DataPacket, Event, TransitionMode};
    use trellis_supply::model::events;
    use trellis_supply::{assemble, PipelineConfig, SupplyChainSystem};

    /// Assemble a pipeline with a strict store and millisecond backoff
    pub fn strict_system() -> SupplyChainSystem {
        let mut config = PipelineConfig::default();
        config.store.transition_mode = TransitionMode::Strict;
        config.supervisor.backoff_unit_ms = 1;
        assemble(&config)
    }

    /// `StockLevelChange` event for `sku`
    pub fn stock_event(sku: &str, level: f64, threshold: f64) -> Event {
        Event::new(
            events::STOCK_LEVEL_CHANGE,
            json!({"sku": sku, "level": level, "threshold": threshold}),
            "warehouse",
        )
    }

    /// `SalesVelocity` event for `sku`
    pub fn velocity_event(sku: &str, velocity: f64, period: f64) -> Event {
        Event::new(
            events::SALES_VELOCITY,
            json!({"sku": sku, "velocity": velocity, "period": period}),
            "pos",
        )
    }

    /// `LogisticsAPI` feed for `supplier_id`
    pub fn lead_time_feed(supplier_id: &str, lead_time: u32) -> DataPacket {
        DataPacket::new(json!({"supplier_id": supplier_id, "lead_time": lead_time}))
    }
}
