//! Channel traits and errors shared by the exchange transports

use async_trait::async_trait;
use std::sync::Arc;

/// Subscribing side of a broker
///
/// Owned by exactly one consumer loop. `receive` waits at most a short,
/// transport defined timeout and returns `Ok(None)` when nothing arrived.
#[async_trait]
pub trait InboundChannel: Send {
    /// Subscribe to a channel
    async fn subscribe(&mut self, channel: &str) -> Result<()>;

    /// Poll for the next raw message
    async fn receive(&mut self) -> Result<Option<Vec<u8>>>;

    /// Drop the subscription
    async fn unsubscribe(&mut self) -> Result<()>;

    /// Release the underlying connection
    async fn close(&mut self) -> Result<()>;
}

/// Publishing side of a broker
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Publish a payload on a channel
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;
}

/// Shared outbound channel handle
pub type OutboundChannelPtr = Arc<dyn OutboundChannel>;

/// Exchange errors
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Channel is not subscribed")]
    NotSubscribed,

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Invalid exchange state: {0}")]
    InvalidState(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

impl From<serde_json::Error> for ExchangeError {
    fn from(e: serde_json::Error) -> Self {
        ExchangeError::Encode(e.to_string())
    }
}
