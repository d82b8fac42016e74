//! In-process broker with the same channel semantics as Redis pub/sub

use crate::base::{ExchangeError, InboundChannel, OutboundChannel, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
struct BrokerMessage {
    channel: String,
    payload: Vec<u8>,
}

struct BrokerInner {
    sender: broadcast::Sender<BrokerMessage>,
    connected: AtomicBool,
    published: Mutex<Vec<(String, String)>>,
}

/// Broadcasts published payloads to every subscription of the same channel
///
/// Messages published while nobody is subscribed are dropped, like Redis
/// does. [`MemoryBroker::disconnect`] makes every client and subscription fail
/// from then on.
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

impl MemoryBroker {
    /// Create a new broker
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a broker buffering up to `capacity` messages per subscription
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(BrokerInner {
                sender,
                connected: AtomicBool::new(true),
                published: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Outbound channel publishing into this broker
    pub fn client(&self) -> MemoryClient {
        MemoryClient {
            broker: self.clone(),
        }
    }

    /// Inbound channel reading from this broker
    pub fn subscription(&self) -> MemorySubscription {
        MemorySubscription {
            broker: self.clone(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            receiver: None,
            channel: None,
        }
    }

    /// Simulate a lost connection
    pub fn disconnect(&self) {
        warn!("Memory broker disconnected");
        self.inner.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }

    /// Every `(channel, payload)` published so far
    pub fn published(&self) -> Vec<(String, String)> {
        self.inner.published.lock().clone()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ExchangeError::Connection(
                "Memory broker is disconnected".to_string(),
            ))
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishing side of a [`MemoryBroker`]
#[derive(Clone)]
pub struct MemoryClient {
    broker: MemoryBroker,
}

#[async_trait]
impl OutboundChannel for MemoryClient {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        self.broker
            .ensure_connected()
            .map_err(|e| ExchangeError::Publish(e.to_string()))?;

        self.broker
            .inner
            .published
            .lock()
            .push((channel.to_string(), payload.to_string()));

        // No receivers is not an error for pub/sub
        let _ = self.broker.inner.sender.send(BrokerMessage {
            channel: channel.to_string(),
            payload: payload.as_bytes().to_vec(),
        });
        Ok(())
    }
}

/// Subscribing side of a [`MemoryBroker`]
pub struct MemorySubscription {
    broker: MemoryBroker,
    read_timeout: Duration,
    receiver: Option<broadcast::Receiver<BrokerMessage>>,
    channel: Option<String>,
}

impl MemorySubscription {
    /// Override how long a single `receive` waits
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

#[async_trait]
impl InboundChannel for MemorySubscription {
    async fn subscribe(&mut self, channel: &str) -> Result<()> {
        self.broker.ensure_connected()?;
        self.receiver = Some(self.broker.inner.sender.subscribe());
        self.channel = Some(channel.to_string());
        debug!(channel = %channel, "Subscribed to memory broker channel");
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        self.broker.ensure_connected()?;

        let (Some(receiver), Some(channel)) = (self.receiver.as_mut(), self.channel.as_deref())
        else {
            return Err(ExchangeError::NotSubscribed);
        };

        let next = async {
            loop {
                match receiver.recv().await {
                    Ok(message) if message.channel == channel => return Ok(message.payload),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Memory subscription lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(ExchangeError::Connection(
                            "Memory broker closed".to_string(),
                        ));
                    }
                }
            }
        };

        match tokio::time::timeout(self.read_timeout, next).await {
            Ok(Ok(payload)) => Ok(Some(payload)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        self.receiver = None;
        if let Some(channel) = self.channel.take() {
            debug!(channel = %channel, "Unsubscribed from memory broker channel");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.receiver = None;
        self.channel = None;
        Ok(())
    }
}
