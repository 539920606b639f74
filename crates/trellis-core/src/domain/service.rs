//! Long-lived, event-reactive services
//!
//! A reactive service owns a [`ServiceCore`] (name, running flag, watcher
//! table, emitter) and implements [`Startable`] for its lifecycle hooks.
//! Dispatch runs the handlers registered for an event type one after the
//! other, in registration order, each to completion before the next.

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::signal_bus::{Emitter, SignalSink};
use crate::types::{Event, Signal};
use crate::CoreError;

/// Which role a monitored component plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Long-lived event-reactive service
    Reactive,
    /// One-shot task executor
    Executor,
    /// External ingestion boundary
    Ingestion,
}

/// Minimal capability a supervisor needs from anything it watches
pub trait Monitorable: Send + Sync {
    /// Service name
    fn name(&self) -> &str;

    /// Role of the service
    fn kind(&self) -> ServiceKind;

    /// Lifecycle state, for services that have one
    fn running(&self) -> Option<bool> {
        None
    }
}

/// Handler invoked for each delivered event of its type
pub type EventHandler = Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), CoreError>> + Send + Sync>;

/// Shared state every reactive service carries
pub struct ServiceCore {
    name: String,
    running: AtomicBool,
    watchers: RwLock<HashMap<String, Vec<EventHandler>>>,
    emitter: Emitter,
}

impl ServiceCore {
    /// Create a stopped service core
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            emitter: Emitter::new(name.clone()),
            name,
            running: AtomicBool::new(false),
            watchers: RwLock::new(HashMap::new()),
        }
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the service is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Append a handler for `event_type`. Handlers are not de-duplicated.
    pub fn watch<F, Fut>(&self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
    {
        let handler: EventHandler =
            Arc::new(move |event: Event| -> BoxFuture<'static, Result<(), CoreError>> {
                Box::pin(handler(event))
            });
        self.watch_handler(event_type, handler);
    }

    /// Append an already boxed handler for `event_type`
    pub fn watch_handler(&self, event_type: impl Into<String>, handler: EventHandler) {
        let event_type = event_type.into();
        debug!(service = %self.name, event_type = %event_type, "Registering watcher");
        self.watchers
            .write()
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Number of handlers registered for `event_type`
    pub fn watcher_count(&self, event_type: &str) -> usize {
        self.watchers.read().get(event_type).map_or(0, Vec::len)
    }

    /// Handle used to emit signals; clones share the connection
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    /// Route this service's emissions to `sink`
    pub fn connect(&self, sink: Arc<dyn SignalSink>) {
        self.emitter.connect(sink);
    }

    fn set_running(&self, running: bool) -> bool {
        self.running.swap(running, Ordering::SeqCst)
    }

    fn handlers(&self, event_type: &str) -> Vec<EventHandler> {
        self.watchers
            .read()
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }

    fn clear_watchers(&self) {
        self.watchers.write().clear();
    }
}

impl std::fmt::Debug for ServiceCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCore")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("event_types", &self.watchers.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lifecycle of a reactive service
///
/// Implementors supply `core` and `on_start`; the provided methods drive
/// the stopped/running state machine and event dispatch.
#[async_trait]
pub trait Startable: Send + Sync {
    /// The service's shared core
    fn core(&self) -> &ServiceCore;

    /// Register watchers; called after the service enters `running`
    async fn on_start(&self) -> Result<(), CoreError>;

    /// Teardown; called after the service enters `stopped`
    async fn on_stop(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Emission call-out; routes to the connected sink by default
    fn on_emit(&self, signal: Signal) {
        self.core().emitter().emit(signal);
    }

    /// stopped -> running. A no-op when already running.
    async fn start(&self) -> Result<(), CoreError> {
        let core = self.core();
        if core.set_running(true) {
            debug!(service = %core.name(), "Service already running");
            return Ok(());
        }

        if let Err(e) = self.on_start().await {
            warn!(service = %core.name(), error = %e, "Service failed to start");
            core.set_running(false);
            core.clear_watchers();
            return Err(e);
        }

        info!(service = %core.name(), "Service started");
        Ok(())
    }

    /// running -> stopped. Safe to call on a stopped service.
    ///
    /// Watchers belong to one running period and are dropped here.
    async fn stop(&self) -> Result<(), CoreError> {
        let core = self.core();
        if !core.set_running(false) {
            debug!(service = %core.name(), "Service not running, nothing to stop");
            return Ok(());
        }

        core.clear_watchers();
        self.on_stop().await?;
        info!(service = %core.name(), "Service stopped");
        Ok(())
    }

    /// Whether the service is running
    fn is_running(&self) -> bool {
        self.core().is_running()
    }

    /// Emit a signal through `on_emit`. Local watchers are not notified.
    fn emit(&self, signal: Signal) {
        self.on_emit(signal);
    }

    /// Dispatch `event` to its watchers in registration order.
    ///
    /// The first handler error stops the dispatch and is returned.
    async fn deliver(&self, event: Event) -> Result<(), CoreError> {
        let core = self.core();
        if !core.is_running() {
            return Err(CoreError::ServiceNotRunning(core.name().to_string()));
        }

        let handlers = core.handlers(&event.event_type);
        if handlers.is_empty() {
            debug!(service = %core.name(), event_type = %event.event_type, "No watchers for event");
            return Ok(());
        }

        debug!(
            service = %core.name(),
            event_type = %event.event_type,
            handlers = handlers.len(),
            "Dispatching event"
        );
        for handler in handlers {
            handler(event.clone()).await?;
        }
        Ok(())
    }
}
