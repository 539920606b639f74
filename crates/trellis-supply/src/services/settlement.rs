//! Settlement executor

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use trellis_core::{CoreError, Executable, Monitorable, ServiceKind, StateStore, StateStoreExt};

use crate::model::{DeliveryProof, PaymentInstruction, PaymentStatus};
use crate::sections;

/// Payment rail recorded on every instruction
pub const PAYMENT_METHOD: &str = "CRYPTO_TRANSFER";

/// Delivery proof consumed by settlement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementInput {
    /// Latest delivery proof
    #[serde(rename = "DeliveryProof", default)]
    pub delivery_proof: Option<DeliveryProof>,
}

/// Issues payment instructions for delivered orders
pub struct SettlementExecutor {
    financials: Arc<dyn StateStore>,
}

impl SettlementExecutor {
    /// Executor name
    pub const NAME: &'static str = "SettlementExecutor";

    /// Create an executor writing to `store`'s `Financials` section
    pub fn new(store: &dyn StateStore) -> Self {
        Self {
            financials: store.subsection(sections::FINANCIALS),
        }
    }
}

#[async_trait]
impl Executable for SettlementExecutor {
    type Input = SettlementInput;
    type Output = PaymentInstruction;

    fn executor_name(&self) -> &str {
        Self::NAME
    }

    async fn process(&self, input: SettlementInput) -> Result<PaymentInstruction, CoreError> {
        let (order_id, amount, recipient) = match input.delivery_proof {
            Some(proof) => (proof.order_id, proof.amount, proof.supplier_id),
            None => ("UNKNOWN".to_string(), 0.0, "UNKNOWN".to_string()),
        };

        Ok(PaymentInstruction {
            payment_id: format!("PAY-{}", Uuid::new_v4()),
            order_id,
            amount,
            recipient,
            method: PAYMENT_METHOD.to_string(),
            status: PaymentStatus::Pending,
        })
    }

    async fn commit(&self, payment: &PaymentInstruction) -> Result<(), CoreError> {
        self.financials.write_json(&payment.payment_id, payment).await
    }
}

impl Monitorable for SettlementExecutor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Executor
    }
}
