//! Trellis Supply - reference supply-chain pipeline
//!
//! Wires the Trellis building blocks into a working pipeline:
//!
//! - reactive services watching inventory, demand and governance events
//! - a supplier ingestion boundary for pricing, capacity and lead times
//! - executors that place purchase orders, plan shipments and issue payments
//! - an operations supervisor and the flows that drive the executors
//!
//! [`assemble`] builds the whole system from a [`PipelineConfig`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod flow;
pub mod model;
pub mod services;
pub mod system;

pub use config::{InvalidOverride, PipelineConfig};
pub use error::{SupplyError, SupplyResult};
pub use flow::{flows, Executors, SupplyChainFlow, GUARANTEES};
pub use system::{assemble, SupplyChainSystem};

/// Store sections used by the pipeline
pub mod sections {
    /// Latest stock level per SKU
    pub const INVENTORY: &str = "Inventory";
    /// Demand forecasts and market signals
    pub const FORECASTS: &str = "Forecasts";
    /// Purchase order commitments
    pub const COMMITMENTS: &str = "Commitments";
    /// Shipment plans
    pub const LOGISTICS: &str = "Logistics";
    /// Payment instructions
    pub const FINANCIALS: &str = "Financials";
}
