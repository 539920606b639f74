//! Configuration for the supply-chain pipeline
//!
//! Values come from an optional YAML file, then environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use trellis_core::{StoreConfig, SupervisorConfig, TransitionMode};
use trellis_monitoring::MonitoringConfig;

use crate::error::{SupplyError, SupplyResult};

/// Whole-pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retry and backoff for the operations supervisor
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Root store naming and commitment mode
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl PipelineConfig {
    /// Load configuration from an optional YAML file and the environment
    pub fn load(path: Option<&Path>) -> SupplyResult<Self> {
        let (config, rejected) = Self::load_deferred(path)?;
        for invalid in &rejected {
            invalid.report();
        }
        Ok(config)
    }

    /// Load like [`PipelineConfig::load`] but hand back rejected overrides
    /// instead of logging them, so the caller can install logging first.
    pub fn load_deferred(path: Option<&Path>) -> SupplyResult<(Self, Vec<InvalidOverride>)> {
        let mut config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        let rejected = config.merge_overrides(|key| std::env::var(key).ok());
        Ok((config, rejected))
    }

    /// Parse a YAML document; missing sections take their defaults
    pub fn from_yaml(yaml: &str) -> SupplyResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if config.store.root_name.is_empty() {
            return Err(SupplyError::ConfigError(
                "store.root_name must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Apply `TRELLIS_*` overrides read through `lookup`.
    ///
    /// Unparsable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for invalid in self.merge_overrides(lookup) {
            invalid.report();
        }
    }

    /// Apply `TRELLIS_*` overrides and return the ones that did not parse
    pub fn merge_overrides<F>(&mut self, lookup: F) -> Vec<InvalidOverride>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();
        let mut reject = |key: &'static str, value: String| {
            rejected.push(InvalidOverride { key, value });
        };

        if let Some(value) = lookup("TRELLIS_MAX_ATTEMPTS") {
            match value.parse::<u32>() {
                Ok(attempts) => self.supervisor.max_attempts = attempts,
                Err(_) => reject("TRELLIS_MAX_ATTEMPTS", value),
            }
        }

        if let Some(value) = lookup("TRELLIS_BACKOFF_UNIT_MS") {
            match value.parse::<u64>() {
                Ok(unit) => self.supervisor.backoff_unit_ms = unit,
                Err(_) => reject("TRELLIS_BACKOFF_UNIT_MS", value),
            }
        }

        if let Some(value) = lookup("TRELLIS_TRANSITION_MODE") {
            match value.parse::<TransitionMode>() {
                Ok(mode) => self.store.transition_mode = mode,
                Err(_) => reject("TRELLIS_TRANSITION_MODE", value),
            }
        }

        if let Some(value) = lookup("TRELLIS_LOG_FILTER") {
            self.monitoring.log_filter = value;
        }

        if let Some(value) = lookup("TRELLIS_LOG_JSON") {
            match value.parse::<bool>() {
                Ok(json) => self.monitoring.json = json,
                Err(_) => reject("TRELLIS_LOG_JSON", value),
            }
        }

        rejected
    }
}

/// An environment override whose value could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOverride {
    pub key: &'static str,
    pub value: String,
}

impl InvalidOverride {
    /// Log the rejection on the current subscriber
    pub fn report(&self) {
        warn!("Invalid {} value: {}", self.key, self.value);
    }
}
