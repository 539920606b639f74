//! Demand forecasting service
//!
//! Forecast = velocity × period × 1.1 (a 10% buffer).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use trellis_core::{
    CoreError, Event, Monitorable, ServiceCore, ServiceKind, Startable, StateStore,
};

use crate::model::{events, stamped, DemandForecast, MarketSignal, SalesVelocity};
use crate::sections;

/// Buffer applied on top of the linear forecast
pub const FORECAST_BUFFER: f64 = 1.1;

/// Linear forecast over `period` days
pub fn forecast(velocity: f64, period: f64) -> f64 {
    velocity * period * FORECAST_BUFFER
}

/// Reactive service turning sales velocity into demand forecasts
pub struct DemandService {
    core: ServiceCore,
    forecasts: Arc<dyn StateStore>,
}

impl DemandService {
    /// Service name
    pub const NAME: &'static str = "DemandService";

    /// Create a stopped service writing to `store`'s `Forecasts` section
    pub fn new(store: &dyn StateStore) -> Self {
        Self {
            core: ServiceCore::new(Self::NAME),
            forecasts: store.subsection(sections::FORECASTS),
        }
    }
}

#[async_trait]
impl Startable for DemandService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    async fn on_start(&self) -> Result<(), CoreError> {
        let emitter = self.core.emitter();
        let forecasts = self.forecasts.clone();
        self.core.watch(events::SALES_VELOCITY, move |event: Event| {
            let emitter = emitter.clone();
            let forecasts = forecasts.clone();
            async move {
                let sales: SalesVelocity = event.payload_as()?;
                let demand = DemandForecast {
                    forecast: forecast(sales.velocity, sales.period),
                    sku: sales.sku,
                    velocity: sales.velocity,
                    period: sales.period,
                };

                emitter.emit(stamped(&demand, DemandService::NAME)?);

                forecasts
                    .write(
                        &demand.sku,
                        json!({
                            "forecast": demand.forecast,
                            "velocity": demand.velocity,
                            "period": demand.period,
                            "timestamp": Utc::now().timestamp_millis(),
                        }),
                    )
                    .await
            }
        });

        let forecasts = self.forecasts.clone();
        self.core.watch(events::MARKET_SIGNAL, move |event: Event| {
            let forecasts = forecasts.clone();
            async move {
                let market: MarketSignal = event.payload_as()?;
                forecasts
                    .write(
                        "market_signals",
                        json!({
                            "signal": market.signal,
                            "impact": market.impact,
                            "timestamp": Utc::now().timestamp_millis(),
                        }),
                    )
                    .await
            }
        });

        Ok(())
    }
}

impl Monitorable for DemandService {
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
