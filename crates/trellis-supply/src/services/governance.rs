//! Governance service
//!
//! Accepts proposals by simple majority and publishes the resulting policy.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use trellis_core::{CoreError, Event, Monitorable, Policy, ServiceCore, ServiceKind, Startable};

use crate::model::{events, stamped, LedgerUpdate, PolicyUpdate, Proposal};

/// Authority recorded on every accepted policy
pub const AUTHORITY: &str = "DAO.TokenWeighted";

/// Reactive service turning passed proposals into policy updates
pub struct GovernanceService {
    core: ServiceCore,
    policies: Arc<RwLock<HashMap<String, Policy>>>,
}

impl GovernanceService {
    /// Service name
    pub const NAME: &'static str = "GovernanceService";

    /// Create a stopped service with no policies
    pub fn new() -> Self {
        Self {
            core: ServiceCore::new(Self::NAME),
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Accepted policy with id `id`
    pub fn policy(&self, id: &str) -> Option<Policy> {
        self.policies.read().get(id).cloned()
    }
}

impl Default for GovernanceService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Startable for GovernanceService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    async fn on_start(&self) -> Result<(), CoreError> {
        let emitter = self.core.emitter();
        let policies = self.policies.clone();
        self.core.watch(events::PROPOSAL_EVENT, move |event: Event| {
            let emitter = emitter.clone();
            let policies = policies.clone();
            async move {
                let proposal: Proposal = event.payload_as()?;
                if !proposal.votes.passed() {
                    debug!(proposal = %proposal.proposal_id, "Proposal rejected");
                    return Ok(());
                }

                let policy = Policy {
                    id: proposal.proposal_id,
                    rules: proposal.policy,
                    version: Utc::now().timestamp_millis(),
                    authority: AUTHORITY.to_string(),
                };
                info!(policy = %policy.id, version = policy.version, "Proposal passed");
                policies.write().insert(policy.id.clone(), policy.clone());

                emitter.emit(stamped(&PolicyUpdate(policy), GovernanceService::NAME)?);
                Ok::<(), CoreError>(())
            }
        });

        self.core.watch(events::LEDGER_UPDATE, |event: Event| async move {
            let update: LedgerUpdate = event.payload_as()?;
            debug!(subsection = %update.subsection, key = %update.key, "Ledger update observed");
            Ok::<(), CoreError>(())
        });

        Ok(())
    }
}

impl Monitorable for GovernanceService {
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
