//! Supervisor for the operational services

use std::ops::Deref;
use std::sync::Arc;
use tracing::warn;

use trellis_core::{CoreError, EscalationSink, HealthSupervisor, Monitorable, SupervisorConfig};

use super::{DemandService, InventoryService, LogisticsExecutor, ProcurementExecutor, SettlementExecutor};

/// [`HealthSupervisor`] watching inventory, demand and the three executors
#[derive(Debug)]
pub struct OperationsSupervisor {
    inner: HealthSupervisor,
}

impl OperationsSupervisor {
    /// Supervisor name
    pub const NAME: &'static str = "OperationsSupervisor";

    /// Create a supervisor with the configured retry policy
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            inner: HealthSupervisor::with_config(Self::NAME, config),
        }
    }

    /// Replace the escalation sink
    pub fn with_escalation(self, sink: Arc<dyn EscalationSink>) -> Self {
        Self {
            inner: self.inner.with_escalation(sink),
        }
    }

    /// Monitor the operational services and log every reported failure
    pub fn setup_monitoring(
        &self,
        inventory: Arc<InventoryService>,
        demand: Arc<DemandService>,
        procurement: Arc<ProcurementExecutor>,
        logistics: Arc<LogisticsExecutor>,
        settlement: Arc<SettlementExecutor>,
    ) {
        let services: [Arc<dyn Monitorable>; 5] = [inventory, demand, procurement, logistics, settlement];
        for service in services {
            self.inner.monitor(service);
        }

        self.inner
            .on_failure(|service: Arc<dyn Monitorable>, err: CoreError| async move {
                warn!(
                    service = %service.name(),
                    kind = ?service.kind(),
                    error = %err,
                    "Operational service failed"
                );
            });
    }
}

impl Deref for OperationsSupervisor {
    type Target = HealthSupervisor;

    fn deref(&self) -> &HealthSupervisor {
        &self.inner
    }
}
