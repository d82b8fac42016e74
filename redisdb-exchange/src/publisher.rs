//! Exchange publisher

use crate::base::{OutboundChannelPtr, Result};
use async_trait::async_trait;
use redisdb_exchange_core::bus::Envelope;
use redisdb_exchange_core::config::DEFAULT_CHANNEL;
use redisdb_exchange_core::{Origin, RoutingKey};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Sends messages to the other services on the exchange
#[async_trait]
pub trait ExchangePublisher: Send + Sync {
    async fn publish(
        &self,
        origin: Origin,
        routing_key: RoutingKey,
        data: Map<String, Value>,
    ) -> Result<()>;
}

/// Publisher stamping every message with this process' sender id
///
/// Payloads are not validated before publishing. Transport failures are
/// returned to the caller and never retried.
#[derive(Clone)]
pub struct Publisher {
    client: OutboundChannelPtr,
    sender_id: String,
    channel: String,
}

impl Publisher {
    /// Create a publisher on the default exchange channel
    pub fn new(client: OutboundChannelPtr, sender_id: impl Into<String>) -> Self {
        Self {
            client,
            sender_id: sender_id.into(),
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    /// Publish on another channel
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl ExchangePublisher for Publisher {
    async fn publish(
        &self,
        origin: Origin,
        routing_key: RoutingKey,
        data: Map<String, Value>,
    ) -> Result<()> {
        let envelope = Envelope::new(origin, routing_key, self.sender_id.as_str(), data);
        let payload = envelope.encode()?;

        match self.client.publish(&self.channel, &payload).await {
            Ok(()) => {
                debug!(
                    origin = %origin,
                    routing_key = %routing_key,
                    channel = %self.channel,
                    "Successfully published message"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    origin = %origin,
                    routing_key = %routing_key,
                    channel = %self.channel,
                    error = %e,
                    "Message could not be published to exchange"
                );
                Err(e)
            }
        }
    }
}
