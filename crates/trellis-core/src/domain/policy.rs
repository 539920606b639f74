use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rule set produced by governance-style flows; opaque to the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy identifier
    pub id: String,

    /// Free-form rules
    pub rules: Map<String, Value>,

    /// Monotonic version
    pub version: i64,

    /// Who issued the policy
    pub authority: String,
}
