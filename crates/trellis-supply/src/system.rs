//! Pipeline assembly

use std::sync::Arc;
use tracing::info;

use trellis_core::{CoreError, Ingestible, SignalSink, Startable};
use trellis_state_inmemory::InMemoryStateStore;

use crate::config::PipelineConfig;
use crate::flow::{Executors, SupplyChainFlow};
use crate::services::{
    DemandService, GovernanceService, InventoryService, LogisticsExecutor, OperationsSupervisor,
    ProcurementExecutor, SettlementExecutor, SupplierIngestion,
};

/// Every component of the pipeline, wired to one store and one signal bus
pub struct SupplyChainSystem {
    /// Shared root store
    pub store: Arc<InMemoryStateStore>,
    /// Stock level watcher
    pub inventory: Arc<InventoryService>,
    /// Demand forecaster
    pub demand: Arc<DemandService>,
    /// Proposal tally
    pub governance: Arc<GovernanceService>,
    /// Supplier data boundary
    pub supplier: Arc<SupplierIngestion>,
    /// Purchase orders
    pub procurement: Arc<ProcurementExecutor>,
    /// Shipment plans
    pub logistics: Arc<LogisticsExecutor>,
    /// Payments
    pub settlement: Arc<SettlementExecutor>,
    /// Failure handling for the operational services
    pub supervisor: Arc<OperationsSupervisor>,
    /// Flows and signal bus
    pub flow: Arc<SupplyChainFlow>,
}

/// Build the pipeline described by `config`.
///
/// Reactive services and the supplier boundary emit onto the flow's bus;
/// the reactive services are managed by the flow for start and stop.
pub fn assemble(config: &PipelineConfig) -> SupplyChainSystem {
    let store = Arc::new(InMemoryStateStore::from_config(&config.store));

    let inventory = Arc::new(InventoryService::new(store.as_ref()));
    let demand = Arc::new(DemandService::new(store.as_ref()));
    let governance = Arc::new(GovernanceService::new());
    let supplier = Arc::new(SupplierIngestion::new());
    let procurement = Arc::new(ProcurementExecutor::new(store.as_ref()));
    let logistics = Arc::new(LogisticsExecutor::new(store.as_ref()));
    let settlement = Arc::new(SettlementExecutor::new(store.as_ref()));

    let supervisor = Arc::new(OperationsSupervisor::new(&config.supervisor));
    supervisor.setup_monitoring(
        inventory.clone(),
        demand.clone(),
        procurement.clone(),
        logistics.clone(),
        settlement.clone(),
    );

    let flow = Arc::new(SupplyChainFlow::new(
        supervisor.clone(),
        Executors {
            procurement: procurement.clone(),
            logistics: logistics.clone(),
            settlement: settlement.clone(),
        },
    ));

    let bus: Arc<dyn SignalSink> = flow.bus();
    inventory.core().connect(bus.clone());
    demand.core().connect(bus.clone());
    governance.core().connect(bus.clone());
    supplier.core().connect(bus);

    flow.manage(inventory.clone());
    flow.manage(demand.clone());
    flow.manage(governance.clone());

    info!(
        store = %config.store.root_name,
        max_attempts = config.supervisor.max_attempts,
        "Supply chain pipeline assembled"
    );

    SupplyChainSystem {
        store,
        inventory,
        demand,
        governance,
        supplier,
        procurement,
        logistics,
        settlement,
        supervisor,
        flow,
    }
}

impl SupplyChainSystem {
    /// Start the managed reactive services
    pub async fn start(&self) -> Result<(), CoreError> {
        self.flow.start_all().await
    }

    /// Stop the managed reactive services
    pub async fn stop(&self) -> Result<(), CoreError> {
        self.flow.stop_all().await
    }
}
