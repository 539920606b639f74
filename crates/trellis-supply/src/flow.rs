//! Supply-chain flows
//!
//! Three flows share the orchestrator's signal bus:
//!
//! - `Replenishment` waits for a reorder, a forecast and a lead time, then
//!   places a purchase order and plans its shipment.
//! - `Adaptation` installs the latest accepted policy.
//! - `Settlement` turns a delivery proof into a payment instruction.
//!
//! Executors run under the operations supervisor, so a failing executor is
//! retried, quarantined and escalated before the flow reports the error.

use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;
use tracing::info;

use trellis_core::{
    consume_as, CoreError, Executable, Flow, FlowOrchestrator, FlowOutcome, Monitorable, Policy,
    SignalBus, SignalKind,
};

use crate::model::{
    stamped, Capacity, DeliveryProof, DemandForecast, LeadTimes, PolicyUpdate, ReorderSignal,
};
use crate::services::{
    LogisticsExecutor, LogisticsInput, OperationsSupervisor, ProcurementExecutor,
    ProcurementInput, SettlementExecutor, SettlementInput,
};

/// Flow names
pub mod flows {
    /// Reorder → purchase order → shipment plan
    pub const REPLENISHMENT: &str = "Replenishment";
    /// Policy hot swap
    pub const ADAPTATION: &str = "Adaptation";
    /// Delivery proof → payment instruction
    pub const SETTLEMENT: &str = "Settlement";
}

/// Guarantees declared by the pipeline
pub const GUARANTEES: [&str; 4] = [
    "EventualConsistency(Ledger)",
    "RoleIsolation",
    "ReplaceableWorkers",
    "PolicyHotSwap",
];

/// Executors driven by the flows
#[derive(Clone)]
pub struct Executors {
    /// Places purchase orders
    pub procurement: Arc<ProcurementExecutor>,
    /// Plans shipments
    pub logistics: Arc<LogisticsExecutor>,
    /// Issues payments
    pub settlement: Arc<SettlementExecutor>,
}

/// Orchestrator of the supply-chain pipeline
pub struct SupplyChainFlow {
    inner: FlowOrchestrator,
    active_policy: Arc<RwLock<Option<Policy>>>,
}

impl SupplyChainFlow {
    /// Orchestrator name
    pub const NAME: &'static str = "SupplyChainFlow";

    /// Register the pipeline flows and guarantees
    pub fn new(supervisor: Arc<OperationsSupervisor>, executors: Executors) -> Self {
        let inner = FlowOrchestrator::new(Self::NAME);
        let active_policy = Arc::new(RwLock::new(None));

        let replenish_body = {
            let supervisor = supervisor.clone();
            let executors = executors.clone();
            move |bus: Arc<SignalBus>| replenish(bus, supervisor.clone(), executors.clone())
        };
        inner.register_flow(Flow::new(
            flows::REPLENISHMENT,
            steps(&[
                "InventoryService.ReorderSignal",
                "DemandService.DemandForecast",
                "SupplierIngestion.LeadTimes",
                "ProcurementExecutor.PurchaseOrder",
                "LogisticsExecutor.ShipmentPlan",
                "SettlementExecutor.PaymentInstruction",
            ]),
            replenish_body,
        ));

        let adapt_body = {
            let active_policy = active_policy.clone();
            move |bus: Arc<SignalBus>| adapt(bus, active_policy.clone())
        };
        inner.register_flow(Flow::new(
            flows::ADAPTATION,
            steps(&[
                "GovernanceService.PolicyUpdate",
                "InventoryService",
                "ProcurementExecutor",
                "LogisticsExecutor",
            ]),
            adapt_body,
        ));

        let settle_body = {
            let settlement = executors.settlement;
            move |bus: Arc<SignalBus>| settle(bus, supervisor.clone(), settlement.clone())
        };
        inner.register_flow(Flow::new(
            flows::SETTLEMENT,
            steps(&["DeliveryProof", "SettlementExecutor.PaymentInstruction"]),
            settle_body,
        ));

        for guarantee in GUARANTEES {
            inner.add_guarantee(guarantee);
        }

        Self {
            inner,
            active_policy,
        }
    }

    /// Policy installed by the most recent `Adaptation` run
    pub fn active_policy(&self) -> Option<Policy> {
        self.active_policy.read().clone()
    }
}

impl Deref for SupplyChainFlow {
    type Target = FlowOrchestrator;

    fn deref(&self) -> &FlowOrchestrator {
        &self.inner
    }
}

impl std::fmt::Debug for SupplyChainFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplyChainFlow")
            .field("inner", &self.inner)
            .field("active_policy", &*self.active_policy.read())
            .finish()
    }
}

fn steps(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn replenish(
    bus: Arc<SignalBus>,
    supervisor: Arc<OperationsSupervisor>,
    executors: Executors,
) -> Result<FlowOutcome, CoreError> {
    let signals = match bus.require(&[ReorderSignal::TYPE, DemandForecast::TYPE, LeadTimes::TYPE]) {
        Ok(signals) => signals,
        Err(missing) => return Ok(FlowOutcome::Deferred { missing }),
    };

    let input: ProcurementInput = consume_as(&signals)?;
    let procurement = executors.procurement;
    let order = supervisor
        .run_supervised(procurement.clone() as Arc<dyn Monitorable>, || {
            procurement.execute(input.clone())
        })
        .await?;
    bus.store(stamped(&order, ProcurementExecutor::NAME)?);

    let shipment = LogisticsInput {
        purchase_order: order.clone(),
        capacity: bus.latest_as::<Capacity>()?,
    };
    let logistics = executors.logistics;
    let plan = supervisor
        .run_supervised(logistics.clone() as Arc<dyn Monitorable>, || {
            logistics.execute(shipment.clone())
        })
        .await?;
    bus.store(stamped(&plan, LogisticsExecutor::NAME)?);

    info!(
        order_id = %order.order_id,
        shipment_id = %plan.shipment_id,
        quantity = order.quantity,
        "Replenishment placed"
    );
    Ok(FlowOutcome::Completed)
}

async fn adapt(
    bus: Arc<SignalBus>,
    active_policy: Arc<RwLock<Option<Policy>>>,
) -> Result<FlowOutcome, CoreError> {
    let Some(PolicyUpdate(policy)) = bus.latest_as::<PolicyUpdate>()? else {
        return Ok(FlowOutcome::Deferred {
            missing: vec![PolicyUpdate::TYPE.to_string()],
        });
    };

    info!(policy = %policy.id, version = policy.version, "Applying policy update");
    *active_policy.write() = Some(policy);
    Ok(FlowOutcome::Completed)
}

async fn settle(
    bus: Arc<SignalBus>,
    supervisor: Arc<OperationsSupervisor>,
    settlement: Arc<SettlementExecutor>,
) -> Result<FlowOutcome, CoreError> {
    let signals = match bus.require(&[DeliveryProof::TYPE]) {
        Ok(signals) => signals,
        Err(missing) => return Ok(FlowOutcome::Deferred { missing }),
    };

    let input: SettlementInput = consume_as(&signals)?;
    let payment = supervisor
        .run_supervised(settlement.clone() as Arc<dyn Monitorable>, || {
            settlement.execute(input.clone())
        })
        .await?;

    info!(
        payment_id = %payment.payment_id,
        order_id = %payment.order_id,
        amount = payment.amount,
        "Settlement issued"
    );
    Ok(FlowOutcome::Completed)
}
