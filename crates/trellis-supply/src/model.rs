//! Payloads exchanged by the supply-chain services
//!
//! Event payloads are decoded with [`Event::payload_as`](trellis_core::Event::payload_as);
//! signal payloads implement [`SignalKind`] so producers and flows agree on
//! their shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use trellis_core::{CoreError, Policy, Signal, SignalKind};

/// Event types watched by the reactive services
pub mod events {
    /// Stock level observation for one SKU
    pub const STOCK_LEVEL_CHANGE: &str = "StockLevelChange";
    /// Free-form SKU lifecycle event
    pub const SKU_EVENT: &str = "SKUEvent";
    /// Observed sales velocity for one SKU
    pub const SALES_VELOCITY: &str = "SalesVelocity";
    /// Market observation
    pub const MARKET_SIGNAL: &str = "MarketSignal";
    /// Governance proposal with its vote tally
    pub const PROPOSAL_EVENT: &str = "ProposalEvent";
    /// Notice that a store entry changed
    pub const LEDGER_UPDATE: &str = "LedgerUpdate";
}

/// Ingestion sources understood by the supplier boundary
pub mod sources {
    /// Supplier pricing and capacity feed
    pub const SUPPLIER_FEED: &str = "SupplierFeed";
    /// Logistics provider lead-time API
    pub const LOGISTICS_API: &str = "LogisticsAPI";
}

/// Build a signal carrying `source` and emission time metadata
pub fn stamped<K: SignalKind>(payload: &K, source: &str) -> Result<Signal, CoreError> {
    Ok(Signal::from_kind(payload)?
        .with_metadata("source", json!(source))
        .with_metadata("timestamp", json!(Utc::now().timestamp_millis())))
}

// ---- event payloads ----

/// Payload of a `StockLevelChange` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevelChange {
    /// Stock keeping unit
    pub sku: String,
    /// Units on hand
    pub level: f64,
    /// Reorder threshold
    pub threshold: f64,
}

/// Payload of a `SKUEvent` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuEvent {
    /// Stock keeping unit
    pub sku: String,
    /// Kind of lifecycle event
    pub event_type: String,
    /// Event details
    #[serde(default)]
    pub data: Value,
}

/// Payload of a `SalesVelocity` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesVelocity {
    /// Stock keeping unit
    pub sku: String,
    /// Units sold per day
    pub velocity: f64,
    /// Forecast horizon in days
    pub period: f64,
}

/// Payload of a `MarketSignal` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignal {
    /// What was observed
    pub signal: String,
    /// Estimated impact
    pub impact: f64,
}

/// Vote tally of a proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Votes {
    /// Weight in favour
    #[serde(rename = "for", default)]
    pub in_favour: u64,
    /// Weight against
    #[serde(default)]
    pub against: u64,
}

impl Votes {
    /// Simple majority
    pub fn passed(&self) -> bool {
        self.in_favour > self.against
    }
}

/// Payload of a `ProposalEvent` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal identifier, reused as the policy id
    pub proposal_id: String,
    /// Proposed rules
    #[serde(default)]
    pub policy: Map<String, Value>,
    /// Vote tally
    #[serde(default)]
    pub votes: Votes,
}

/// Payload of a `LedgerUpdate` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerUpdate {
    /// Store section that changed
    pub subsection: String,
    /// Key that changed
    pub key: String,
}

// ---- ingestion payloads ----

/// Payload ingested from `SupplierFeed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierFeed {
    /// Supplier identifier
    pub supplier_id: String,
    /// Price list
    pub pricing: Value,
    /// Capacity figures
    pub capacity: Value,
}

/// Payload ingested from `LogisticsAPI`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsFeed {
    /// Supplier identifier
    pub supplier_id: String,
    /// Lead time in days
    pub lead_time: u32,
}

// ---- signals ----

/// Stock fell below its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderSignal {
    /// Stock keeping unit
    pub sku: String,
    /// Units on hand
    pub current_level: f64,
    /// Reorder threshold
    pub threshold: f64,
}

impl SignalKind for ReorderSignal {
    const TYPE: &'static str = "ReorderSignal";
}

/// Stock rose above three times its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverstockSignal {
    /// Stock keeping unit
    pub sku: String,
    /// Units on hand
    pub current_level: f64,
    /// Reorder threshold
    pub threshold: f64,
}

impl SignalKind for OverstockSignal {
    const TYPE: &'static str = "OverstockSignal";
}

/// Forecast demand for one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    /// Stock keeping unit
    pub sku: String,
    /// Units expected over the period
    pub forecast: f64,
    /// Units sold per day
    pub velocity: f64,
    /// Forecast horizon in days
    pub period: f64,
}

impl SignalKind for DemandForecast {
    const TYPE: &'static str = "DemandForecast";
}

/// Supplier price list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Supplier identifier
    pub supplier_id: String,
    /// Price list
    pub pricing: Value,
}

impl SignalKind for Pricing {
    const TYPE: &'static str = "Pricing";
}

/// Supplier capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    /// Supplier identifier
    pub supplier_id: String,
    /// Capacity figures
    pub capacity: Value,
}

impl SignalKind for Capacity {
    const TYPE: &'static str = "Capacity";
}

/// Supplier lead time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimes {
    /// Supplier identifier
    pub supplier_id: String,
    /// Lead time in days
    pub lead_time: u32,
}

impl SignalKind for LeadTimes {
    const TYPE: &'static str = "LeadTimes";
}

/// Policy accepted by governance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyUpdate(pub Policy);

impl SignalKind for PolicyUpdate {
    const TYPE: &'static str = "PolicyUpdate";
}

/// Goods received; triggers settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryProof {
    /// Order that was delivered
    pub order_id: String,
    /// Amount owed
    pub amount: f64,
    /// Who delivered
    pub supplier_id: String,
}

impl SignalKind for DeliveryProof {
    const TYPE: &'static str = "DeliveryProof";
}

// ---- executor outputs ----

/// Order placed with a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// `PO-<uuid>`
    pub order_id: String,
    /// Stock keeping unit
    pub sku: String,
    /// Units ordered
    pub quantity: u64,
    /// Supplier identifier
    pub supplier_id: String,
    /// Expected delivery date
    pub expected_delivery: DateTime<Utc>,
    /// Order value
    pub total_cost: f64,
}

impl SignalKind for PurchaseOrder {
    const TYPE: &'static str = "PurchaseOrder";
}

/// Transport plan for an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentPlan {
    /// `SH-<uuid>`
    pub shipment_id: String,
    /// Order being shipped
    pub order_id: String,
    /// Stops, origin first
    pub route: Vec<String>,
    /// Estimated arrival
    pub estimated_arrival: DateTime<Utc>,
    /// Selected carrier
    pub carrier: String,
    /// `TRK-<uuid>`
    pub tracking_number: String,
}

impl SignalKind for ShipmentPlan {
    const TYPE: &'static str = "ShipmentPlan";
}

/// Settlement status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting processing
    Pending,
    /// Paid
    Processed,
    /// Rejected
    Failed,
}

/// Instruction to pay a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInstruction {
    /// `PAY-<uuid>`
    pub payment_id: String,
    /// Order being paid
    pub order_id: String,
    /// Amount to transfer
    pub amount: f64,
    /// Supplier receiving the payment
    pub recipient: String,
    /// Payment rail
    pub method: String,
    /// Settlement status
    pub status: PaymentStatus,
}
