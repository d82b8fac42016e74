//! Events raised by the exchange for in-process listeners

use crate::types::{Origin, RoutingKey};
use serde::Serialize;
use serde_json::{Map, Value};

/// A validated exchange message was received
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReceivedEvent {
    pub origin: Origin,
    pub routing_key: RoutingKey,
    pub data: Map<String, Value>,
}

impl MessageReceivedEvent {
    /// Name the event is dispatched under
    pub const EVENT_NAME: &'static str = "exchange.messageReceived";

    /// Create a new message received event
    pub fn new(origin: Origin, routing_key: RoutingKey, data: Map<String, Value>) -> Self {
        Self {
            origin,
            routing_key,
            data,
        }
    }
}

/// Events published on the [`EventBus`](super::EventBus)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum ExchangeEvent {
    MessageReceived(MessageReceivedEvent),
}

impl ExchangeEvent {
    /// Name listeners subscribe to
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeEvent::MessageReceived(_) => MessageReceivedEvent::EVENT_NAME,
        }
    }
}

impl From<MessageReceivedEvent> for ExchangeEvent {
    fn from(event: MessageReceivedEvent) -> Self {
        ExchangeEvent::MessageReceived(event)
    }
}
