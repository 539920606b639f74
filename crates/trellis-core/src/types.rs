use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use crate::CoreError;

/// Represents a packet of data flowing through the system
///
/// This is a wrapper around a JSON value with some helper methods
/// for working with data in different formats. Signals, events and
/// ingested feeds all carry their payload as a `DataPacket`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DataPacket {
    /// The inner JSON value
    pub value: serde_json::Value,
}

impl DataPacket {
    /// Create a new data packet from a JSON value
    #[inline]
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Create a null data packet
    #[inline]
    pub fn null() -> Self {
        Self {
            value: serde_json::Value::Null,
        }
    }

    /// Get the inner JSON value
    #[inline]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Take ownership of the inner JSON value
    #[inline]
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// Check if the data packet is null
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Look up a field of an object payload
    #[inline]
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.value.get(field)
    }

    /// Try to convert the data packet to a specific type
    pub fn to<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.value.clone())
    }

    /// Create a data packet from a serializable value
    pub fn from<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        Ok(Self::new(serde_json::to_value(value)?))
    }
}

impl From<serde_json::Value> for DataPacket {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

/// A payload struct bound to a fixed signal type.
///
/// Implementing this gives the payload a schema: producers build signals
/// with [`Signal::from_kind`] and consumers read them back with
/// [`Signal::data_as`], so a mismatched payload surfaces as a
/// [`CoreError::ValidationError`] instead of travelling the pipeline untyped.
pub trait SignalKind: Serialize + DeserializeOwned {
    /// Signal type string this payload is published under
    const TYPE: &'static str;
}

/// A typed observation or derived fact emitted by a service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    /// Signal type, the key the bus indexes on
    #[serde(rename = "type")]
    pub signal_type: String,

    /// Payload
    pub data: DataPacket,

    /// Optional free-form metadata (source, timestamps, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Signal {
    /// Create a new signal with no metadata
    pub fn new(signal_type: impl Into<String>, data: impl Into<DataPacket>) -> Self {
        Self {
            signal_type: signal_type.into(),
            data: data.into(),
            metadata: HashMap::new(),
        }
    }

    /// Build a signal from a typed payload
    pub fn from_kind<K: SignalKind>(payload: &K) -> Result<Self, CoreError> {
        Ok(Self::new(K::TYPE, DataPacket::from(payload)?))
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Decode the payload into a typed struct
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        self.data.to().map_err(|e| {
            CoreError::ValidationError(format!(
                "signal {} does not match expected payload: {}",
                self.signal_type, e
            ))
        })
    }
}

/// Internal notification delivered to a reactive service's watchers
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Event type used to select handlers
    #[serde(rename = "type")]
    pub event_type: String,

    /// Payload
    pub payload: DataPacket,

    /// When the event was created
    pub timestamp: DateTime<Utc>,

    /// Who produced the event
    pub source: String,
}

impl Event {
    /// Create a new event stamped with the current time
    pub fn new(
        event_type: impl Into<String>,
        payload: impl Into<DataPacket>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload: payload.into(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }

    /// Decode the payload into a typed struct
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        self.payload.to().map_err(|e| {
            CoreError::ValidationError(format!(
                "event {} does not match expected payload: {}",
                self.event_type, e
            ))
        })
    }
}
