//! Supplier ingestion boundary
//!
//! `SupplierFeed` payloads become `Pricing` and `Capacity` signals,
//! `LogisticsAPI` payloads become `LeadTimes`. Other sources are recorded
//! and otherwise ignored.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use trellis_core::{CoreError, DataPacket, Ingestible, IngestionCore, Monitorable, ServiceKind};

use crate::model::{sources, stamped, Capacity, LeadTimes, LogisticsFeed, Pricing, SupplierFeed};

/// Boundary for supplier and logistics provider data
#[derive(Debug)]
pub struct SupplierIngestion {
    core: IngestionCore,
}

impl SupplierIngestion {
    /// Boundary name
    pub const NAME: &'static str = "SupplierIngestion";

    /// Create a boundary with no recorded feeds
    pub fn new() -> Self {
        Self {
            core: IngestionCore::new(Self::NAME),
        }
    }
}

impl Default for SupplierIngestion {
    fn default() -> Self {
        Self::new()
    }
}

fn validate<T: DeserializeOwned>(source: &str, data: &DataPacket) -> Result<T, CoreError> {
    data.to().map_err(|e| {
        CoreError::ValidationError(format!("invalid {} payload: {}", source, e))
    })
}

#[async_trait]
impl Ingestible for SupplierIngestion {
    fn core(&self) -> &IngestionCore {
        &self.core
    }

    async fn on_ingest(&self, source: &str, data: &DataPacket) -> Result<(), CoreError> {
        match source {
            sources::SUPPLIER_FEED => {
                let feed: SupplierFeed = validate(source, data)?;
                let pricing = stamped(
                    &Pricing {
                        supplier_id: feed.supplier_id.clone(),
                        pricing: feed.pricing,
                    },
                    Self::NAME,
                )?;
                let capacity = stamped(
                    &Capacity {
                        supplier_id: feed.supplier_id,
                        capacity: feed.capacity,
                    },
                    Self::NAME,
                )?;
                self.emit(pricing);
                self.emit(capacity);
            }
            sources::LOGISTICS_API => {
                let feed: LogisticsFeed = validate(source, data)?;
                self.emit(stamped(
                    &LeadTimes {
                        supplier_id: feed.supplier_id,
                        lead_time: feed.lead_time,
                    },
                    Self::NAME,
                )?);
            }
            other => {
                debug!(source = %other, "No signals derived from source");
            }
        }
        Ok(())
    }
}

impl Monitorable for SupplierIngestion {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Ingestion
    }
}
