//! Error types for the supply-chain pipeline
//!
//! Building blocks report [`CoreError`]; this type adds the failures of
//! loading configuration and driving the assembled system.

use thiserror::Error;
use trellis_core::CoreError;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum SupplyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reading a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid YAML for the pipeline config
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error raised by a building block
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result alias for pipeline operations
pub type SupplyResult<T> = Result<T, SupplyError>;
