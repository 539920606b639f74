//! Logging setup for Trellis pipelines.

use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::init_logging;

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup record
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Log level filter (e.g., "info,trellis=debug"); `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON records instead of pretty text
    #[serde(default)]
    pub json: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            json: false,
        }
    }
}

/// Default value for the service name
fn default_service_name() -> String {
    "trellis".to_string()
}

/// Default value for the log filter
fn default_log_filter() -> String {
    "info,trellis=debug".to_string()
}
