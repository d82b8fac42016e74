//! Wire envelope and its JSON codec

use crate::types::{Origin, RoutingKey};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a raw exchange message could not be turned into an [`Envelope`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message is not valid JSON: {0}")]
    Malformed(String),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message origin is missing or unknown")]
    UnknownOrigin,

    #[error("message routing key is missing or unknown")]
    UnknownRoutingKey,

    #[error("message data is missing")]
    MissingData,

    #[error("message data is not a JSON object")]
    DataNotAnObject,
}

/// Message exchanged over the broker
///
/// ```json
/// {
///   "routing_key": "devices.entity.updated",
///   "origin": "devices_module",
///   "sender_id": "11111111-1111-1111-1111-111111111111",
///   "data": {"key_one": "value_one"}
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    origin: Origin,
    routing_key: RoutingKey,
    sender_id: String,
    data: Map<String, Value>,
}

/// Serialized form, field order fixes the key order on the wire
#[derive(Serialize)]
struct WireEnvelope<'a> {
    routing_key: &'a str,
    origin: &'a str,
    sender_id: &'a str,
    data: &'a Map<String, Value>,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(
        origin: Origin,
        routing_key: RoutingKey,
        sender_id: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            origin,
            routing_key,
            sender_id: sender_id.into(),
            data,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn routing_key(&self) -> RoutingKey {
        self.routing_key
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Encode to the compact JSON wire form
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(&WireEnvelope {
            routing_key: self.routing_key.as_str(),
            origin: self.origin.as_str(),
            sender_id: &self.sender_id,
            data: &self.data,
        })
    }

    /// Decode a raw exchange message
    ///
    /// Unknown keys are ignored. A missing `sender_id` decodes as an empty
    /// string, every other field is required.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let Value::Object(mut message) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let origin = message
            .get("origin")
            .and_then(Value::as_str)
            .and_then(Origin::from_value)
            .ok_or(DecodeError::UnknownOrigin)?;
        let routing_key = message
            .get("routing_key")
            .and_then(Value::as_str)
            .and_then(RoutingKey::from_value)
            .ok_or(DecodeError::UnknownRoutingKey)?;
        let sender_id = message
            .get("sender_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let data = match message.remove("data") {
            Some(Value::Object(data)) => data,
            Some(Value::Null) | None => return Err(DecodeError::MissingData),
            Some(_) => return Err(DecodeError::DataNotAnObject),
        };

        Ok(Self {
            origin,
            routing_key,
            sender_id,
            data,
        })
    }
}
