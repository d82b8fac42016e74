//! Local consumer of validated exchange messages

use crate::types::{Origin, RoutingKey};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Receives every message that passed schema validation
///
/// The payload is only borrowed for the duration of the call; implementations
/// copy whatever they need to keep.
#[async_trait]
pub trait ExchangeConsumer: Send + Sync {
    async fn consume(&self, origin: Origin, routing_key: RoutingKey, data: &Map<String, Value>);
}

/// Shared consumer handle
pub type ExchangeConsumerPtr = Arc<dyn ExchangeConsumer>;
