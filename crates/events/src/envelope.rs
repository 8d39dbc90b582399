//! Transport envelope for inbound events.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::inbound::InboundEvent;

#[derive(Debug, Error)]
pub enum EventError {
    /// The raw message was not a well-formed envelope.
    #[error("malformed event envelope: {0}")]
    Malformed(String),
}

/// Envelope for one inbound event, carrying the producer's routing metadata.
///
/// The upstream feed wraps every payload in a CloudEvents-style envelope; the
/// fields beyond `data` are carried for logging/correlation and are otherwise
/// opaque to the reconciliation core. Producer-optional fields default to
/// empty so a sparse envelope still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    id: String,
    source: String,
    #[serde(default)]
    specversion: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    datacontenttype: Option<String>,
    #[serde(default)]
    dataschema: Option<String>,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    destination: String,
    data: InboundEvent,
}

impl EventEnvelope {
    /// Wrap a payload in a minimal envelope (producer side; used by tests and demos).
    pub fn wrap(source: impl Into<String>, event_type: impl Into<String>, data: InboundEvent) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            source: source.into(),
            specversion: "1.0".to_string(),
            event_type: event_type.into(),
            datacontenttype: Some("application/json".to_string()),
            dataschema: None,
            time: data.timestamp.timestamp(),
            subject: data.movement_id.to_string(),
            destination: String::new(),
            data,
        }
    }

    /// Decode an envelope from raw message bytes.
    pub fn decode(raw: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(raw).map_err(|e| EventError::Malformed(e.to_string()))
    }

    /// Encode the envelope to message bytes.
    pub fn encode(&self) -> Vec<u8> {
        // Serialization of an owned value with no non-string map keys cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &InboundEvent {
        &self.data
    }

    pub fn into_data(self) -> InboundEvent {
        self.data
    }
}
