//! Health supervision: monitoring, retry, quarantine and escalation
//!
//! Services never retry on their own. A supervisor wraps an operation,
//! retries it with exponential backoff and, once attempts run out, reports
//! the failure, quarantines the service and escalates. Quarantine only
//! removes the service from the monitored set; its lifecycle is untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::service::Monitorable;
use crate::config::SupervisorConfig;
use crate::CoreError;

/// Callback invoked for every reported failure
pub type FailureHandler =
    Arc<dyn Fn(Arc<dyn Monitorable>, CoreError) -> BoxFuture<'static, ()> + Send + Sync>;

/// An unresolved failure handed to an external authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Supervisor raising the issue
    pub supervisor: String,

    /// Short description of the issue
    pub issue: String,

    /// Free-form context (service name, error, ...)
    pub context: Value,

    /// When the issue was escalated
    pub timestamp: DateTime<Utc>,
}

/// Terminal reporting sink for escalations
#[async_trait]
pub trait EscalationSink: Send + Sync {
    /// Report one escalation
    async fn escalate(&self, escalation: Escalation) -> Result<(), CoreError>;
}

/// Escalation sink that only records the issue in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEscalation;

#[async_trait]
impl EscalationSink for LogEscalation {
    async fn escalate(&self, escalation: Escalation) -> Result<(), CoreError> {
        error!(
            supervisor = %escalation.supervisor,
            issue = %escalation.issue,
            context = %escalation.context,
            "Escalating to governance authority"
        );
        Ok(())
    }
}

/// Attempt budget and backoff shape for [`HealthSupervisor::retry_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made before the last error is returned
    pub max_attempts: u32,

    /// Base delay; the wait after failed attempt `n` is `2^n` units
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
        }
    }

    /// Delay after failed attempt `attempt` (1-based). No jitter, no cap.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl From<&SupervisorConfig> for RetryPolicy {
    fn from(config: &SupervisorConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_unit())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SupervisorConfig::default())
    }
}

/// Monitors services and owns the failure-handling pipeline
pub struct HealthSupervisor {
    name: String,
    policy: RetryPolicy,
    monitored: RwLock<Vec<Arc<dyn Monitorable>>>,
    failure_handlers: RwLock<Vec<FailureHandler>>,
    escalation: Arc<dyn EscalationSink>,
}

impl HealthSupervisor {
    /// Create a supervisor with the default retry policy and log escalation
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &SupervisorConfig::default())
    }

    /// Create a supervisor from configuration
    pub fn with_config(name: impl Into<String>, config: &SupervisorConfig) -> Self {
        Self {
            name: name.into(),
            policy: RetryPolicy::from(config),
            monitored: RwLock::new(Vec::new()),
            failure_handlers: RwLock::new(Vec::new()),
            escalation: Arc::new(LogEscalation),
        }
    }

    /// Replace the escalation sink
    pub fn with_escalation(mut self, sink: Arc<dyn EscalationSink>) -> Self {
        self.escalation = sink;
        self
    }

    /// Supervisor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retry policy used by [`retry`](Self::retry) and [`run_supervised`](Self::run_supervised)
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Add a service to the monitored set. Duplicates are kept.
    pub fn monitor(&self, service: Arc<dyn Monitorable>) {
        debug!(supervisor = %self.name, service = %service.name(), "Monitoring service");
        self.monitored.write().push(service);
    }

    /// Snapshot of the monitored set, in monitoring order
    pub fn monitored(&self) -> Vec<Arc<dyn Monitorable>> {
        self.monitored.read().clone()
    }

    /// Whether this exact service instance is monitored
    pub fn is_monitored(&self, service: &Arc<dyn Monitorable>) -> bool {
        self.monitored
            .read()
            .iter()
            .any(|candidate| same_service(candidate, service))
    }

    /// Remove the first occurrence of `service` from the monitored set.
    ///
    /// Returns whether anything was removed. The service keeps running.
    pub fn quarantine(&self, service: &Arc<dyn Monitorable>) -> bool {
        let mut monitored = self.monitored.write();
        match monitored.iter().position(|candidate| same_service(candidate, service)) {
            Some(pos) => {
                monitored.remove(pos);
                warn!(supervisor = %self.name, service = %service.name(), "Service quarantined");
                true
            }
            None => false,
        }
    }

    /// Register a failure callback
    pub fn on_failure<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<dyn Monitorable>, CoreError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: FailureHandler = Arc::new(
            move |service: Arc<dyn Monitorable>, err: CoreError| -> BoxFuture<'static, ()> {
                Box::pin(handler(service, err))
            },
        );
        self.failure_handlers.write().push(handler);
    }

    /// Run every failure handler, in registration order, one at a time
    pub async fn handle_failure(&self, service: Arc<dyn Monitorable>, err: CoreError) {
        warn!(
            supervisor = %self.name,
            service = %service.name(),
            error = %err,
            "Handling service failure"
        );
        let handlers = self.failure_handlers.read().clone();
        for handler in handlers {
            handler(service.clone(), err.clone()).await;
        }
    }

    /// Retry `operation` up to `max_attempts` times with the supervisor's backoff unit
    pub async fn retry<T, F, Fut>(&self, operation: F, max_attempts: u32) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let policy = RetryPolicy::new(max_attempts, self.policy.backoff_unit);
        self.retry_with(policy, operation).await
    }

    /// Retry `operation` under `policy`.
    ///
    /// After the final failed attempt the last error is returned unchanged.
    /// A zero attempt budget still makes one attempt.
    pub async fn retry_with<T, F, Fut>(&self, policy: RetryPolicy, mut operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    warn!(
                        supervisor = %self.name,
                        attempt,
                        error = %err,
                        "Retry attempts exhausted"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = policy.delay(attempt);
                    debug!(
                        supervisor = %self.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Report an unresolved issue to the escalation sink
    pub async fn escalate_to_dao(&self, issue: impl Into<String>, context: Value) -> Result<(), CoreError> {
        let escalation = Escalation {
            supervisor: self.name.clone(),
            issue: issue.into(),
            context,
            timestamp: Utc::now(),
        };
        self.escalation.escalate(escalation).await
    }

    /// Run `operation` under full supervision.
    ///
    /// On exhaustion the failure handlers run, the service is quarantined
    /// and the issue escalated; the last error is then returned unchanged.
    /// An escalation failure is logged and does not replace that error.
    pub async fn run_supervised<T, F, Fut>(
        &self,
        service: Arc<dyn Monitorable>,
        operation: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let err = match self.retry_with(self.policy, operation).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        self.handle_failure(service.clone(), err.clone()).await;
        self.quarantine(&service);

        let context = json!({
            "service": service.name(),
            "error": err.to_string(),
        });
        if let Err(escalation_err) = self
            .escalate_to_dao("Service failure after retries", context)
            .await
        {
            warn!(
                supervisor = %self.name,
                error = %escalation_err,
                "Escalation failed"
            );
        }

        info!(supervisor = %self.name, service = %service.name(), "Supervised operation gave up");
        Err(err)
    }
}

impl std::fmt::Debug for HealthSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthSupervisor")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field(
                "monitored",
                &self
                    .monitored
                    .read()
                    .iter()
                    .map(|s| s.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("failure_handlers", &self.failure_handlers.read().len())
            .finish()
    }
}

fn same_service(a: &Arc<dyn Monitorable>, b: &Arc<dyn Monitorable>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
