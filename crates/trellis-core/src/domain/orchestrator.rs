//! Flow orchestration over a signal blackboard
//!
//! Flows are registered by name and enumerated in registration order.
//! A flow body reads its prerequisites from the orchestrator's
//! [`SignalBus`]; when one is missing it returns
//! [`FlowOutcome::Deferred`] and waits for a later invocation.
//! The `steps` list documents a flow, it is never scheduled.

use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::registry::OrderedRegistry;
use super::service::Startable;
use super::signal_bus::{SignalBus, SignalSink};
use crate::types::Signal;
use crate::CoreError;

/// What a flow body did on one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The body ran to the end
    Completed,
    /// Prerequisite signals were absent; nothing was done
    Deferred {
        /// Signal types that were missing
        missing: Vec<String>,
    },
}

impl FlowOutcome {
    /// Whether the body ran to the end
    pub fn is_completed(&self) -> bool {
        matches!(self, FlowOutcome::Completed)
    }
}

/// Boxed flow body; receives the orchestrator's signal bus
pub type FlowBody =
    Arc<dyn Fn(Arc<SignalBus>) -> BoxFuture<'static, Result<FlowOutcome, CoreError>> + Send + Sync>;

/// A named, registered procedure
#[derive(Clone)]
pub struct Flow {
    /// Registration name
    pub name: String,

    /// Step identifiers, for documentation
    pub steps: Vec<String>,

    body: FlowBody,
}

impl Flow {
    /// Create a flow from an async body
    pub fn new<F, Fut>(name: impl Into<String>, steps: Vec<String>, body: F) -> Self
    where
        F: Fn(Arc<SignalBus>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FlowOutcome, CoreError>> + Send + 'static,
    {
        let body: FlowBody = Arc::new(
            move |bus: Arc<SignalBus>| -> BoxFuture<'static, Result<FlowOutcome, CoreError>> {
                Box::pin(body(bus))
            },
        );
        Self {
            name: name.into(),
            steps,
            body,
        }
    }

    /// Run the body once
    pub async fn run(&self, bus: Arc<SignalBus>) -> Result<FlowOutcome, CoreError> {
        (self.body)(bus).await
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .finish()
    }
}

/// Registers flows, holds the signal bus and executes flows on demand
pub struct FlowOrchestrator {
    name: String,
    flows: RwLock<OrderedRegistry<Flow>>,
    guarantees: RwLock<Vec<String>>,
    bus: Arc<SignalBus>,
    services: RwLock<Vec<Arc<dyn Startable>>>,
}

impl FlowOrchestrator {
    /// Create an orchestrator with an empty bus
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flows: RwLock::new(OrderedRegistry::new()),
            guarantees: RwLock::new(Vec::new()),
            bus: Arc::new(SignalBus::new()),
            services: RwLock::new(Vec::new()),
        }
    }

    /// Orchestrator name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signal bus; connect services and boundaries to it
    pub fn bus(&self) -> Arc<SignalBus> {
        self.bus.clone()
    }

    /// Register `flow`, overwriting any flow with the same name
    pub fn register_flow(&self, flow: Flow) {
        let name = flow.name.clone();
        if self.flows.write().insert(name.clone(), flow).is_some() {
            debug!(orchestrator = %self.name, flow = %name, "Replaced existing flow");
        } else {
            debug!(orchestrator = %self.name, flow = %name, "Registered flow");
        }
    }

    /// Run the flow registered as `name`
    pub async fn execute_flow(&self, name: &str) -> Result<FlowOutcome, CoreError> {
        let flow = self
            .flows
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::FlowNotFound(name.to_string()))?;

        debug!(orchestrator = %self.name, flow = %name, "Executing flow");
        let outcome = flow.run(self.bus.clone()).await?;
        match &outcome {
            FlowOutcome::Completed => {
                info!(orchestrator = %self.name, flow = %name, "Flow completed");
            }
            FlowOutcome::Deferred { missing } => {
                info!(
                    orchestrator = %self.name,
                    flow = %name,
                    missing = ?missing,
                    "Flow deferred, waiting for signals"
                );
            }
        }
        Ok(outcome)
    }

    /// Registered flows, in registration order
    pub fn flows(&self) -> Vec<Flow> {
        self.flows.read().values().cloned().collect()
    }

    /// Append a guarantee statement
    pub fn add_guarantee(&self, guarantee: impl Into<String>) {
        self.guarantees.write().push(guarantee.into());
    }

    /// Guarantee statements, in insertion order
    pub fn guarantees(&self) -> Vec<String> {
        self.guarantees.read().clone()
    }

    /// Append a signal to the bus
    pub fn store_signal(&self, signal: Signal) {
        self.bus.store(signal);
    }

    /// Most recent signal of `signal_type`
    pub fn get_signal(&self, signal_type: &str) -> Option<Signal> {
        self.bus.latest(signal_type)
    }

    /// Every signal received for `signal_type`, oldest first
    pub fn signal_history(&self, signal_type: &str) -> Vec<Signal> {
        self.bus.history(signal_type)
    }

    /// Latest signal of each type, or the types still missing
    pub fn require(&self, signal_types: &[&str]) -> Result<Vec<Signal>, Vec<String>> {
        self.bus.require(signal_types)
    }

    /// Add a service to the start/stop set
    pub fn manage(&self, service: Arc<dyn Startable>) {
        self.services.write().push(service);
    }

    /// Start every managed service in management order.
    ///
    /// Stops at the first failure.
    pub async fn start_all(&self) -> Result<(), CoreError> {
        let services = self.services.read().clone();
        for service in services {
            service.start().await?;
        }
        info!(orchestrator = %self.name, "All services started");
        Ok(())
    }

    /// Stop every managed service in management order.
    ///
    /// Every service is asked to stop; the first error is returned.
    pub async fn stop_all(&self) -> Result<(), CoreError> {
        let services = self.services.read().clone();
        let mut first_err = None;
        for service in services {
            if let Err(e) = service.stop().await {
                warn!(orchestrator = %self.name, service = %service.core().name(), error = %e, "Service failed to stop");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                info!(orchestrator = %self.name, "All services stopped");
                Ok(())
            }
        }
    }
}

impl SignalSink for FlowOrchestrator {
    fn accept(&self, signal: Signal) {
        self.store_signal(signal);
    }
}

impl std::fmt::Debug for FlowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowOrchestrator")
            .field("name", &self.name)
            .field("flows", &self.flows.read().names().collect::<Vec<_>>())
            .field("guarantees", &*self.guarantees.read())
            .finish()
    }
}
