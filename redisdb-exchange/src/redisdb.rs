//! Redis pub/sub transport

use crate::base::{ExchangeError, InboundChannel, OutboundChannel, Result};
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSub};
use redis::AsyncCommands;
use redisdb_exchange_core::config::{ExchangeConfig, RedisConfig};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

fn open_client(config: &RedisConfig) -> Result<redis::Client> {
    redis::Client::open(config.url()).map_err(|e| {
        ExchangeError::Connection(format!(
            "Invalid Redis connection settings for {}:{}: {}",
            config.host, config.port, e
        ))
    })
}

/// Inbound channel backed by a Redis pub/sub connection
pub struct RedisSubscription {
    client: redis::Client,
    read_timeout: Duration,
    pubsub: Option<PubSub>,
    channel: Option<String>,
}

impl RedisSubscription {
    /// Create a subscription, no connection is made until `subscribe`
    pub fn new(client: redis::Client, read_timeout: Duration) -> Self {
        Self {
            client,
            read_timeout,
            pubsub: None,
            channel: None,
        }
    }

    /// Build from the `redis` and `exchange` configuration sections
    pub fn from_config(redis: &RedisConfig, exchange: &ExchangeConfig) -> Result<Self> {
        Ok(Self::new(
            open_client(redis)?,
            Duration::from_millis(exchange.read_timeout_ms),
        ))
    }
}

#[async_trait]
impl InboundChannel for RedisSubscription {
    async fn subscribe(&mut self, channel: &str) -> Result<()> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| ExchangeError::Connection(format!("Redis connection failed: {}", e)))?;

        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| ExchangeError::Connection(format!("Redis subscribe failed: {}", e)))?;

        info!(channel = %channel, "Subscribed to Redis exchange channel");
        self.pubsub = Some(pubsub);
        self.channel = Some(channel.to_string());
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        let pubsub = self.pubsub.as_mut().ok_or(ExchangeError::NotSubscribed)?;
        let mut messages = std::pin::pin!(pubsub.on_message());

        match tokio::time::timeout(self.read_timeout, messages.next()).await {
            Ok(Some(msg)) => Ok(Some(msg.get_payload_bytes().to_vec())),
            Ok(None) => Err(ExchangeError::Connection(
                "Redis pub/sub connection closed".to_string(),
            )),
            Err(_) => Ok(None),
        }
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        let (Some(pubsub), Some(channel)) = (self.pubsub.as_mut(), self.channel.take()) else {
            return Ok(());
        };

        pubsub
            .unsubscribe(&channel)
            .await
            .map_err(|e| ExchangeError::Connection(format!("Redis unsubscribe failed: {}", e)))?;

        debug!(channel = %channel, "Unsubscribed from Redis exchange channel");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.pubsub.take().is_some() {
            debug!("Redis pub/sub connection released");
        }
        self.channel = None;
        Ok(())
    }
}

/// Outbound channel publishing through a lazily opened multiplexed connection
pub struct RedisClient {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisClient {
    /// Create a client, the connection is opened on first publish
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            connection: OnceCell::new(),
        }
    }

    /// Build from the `redis` configuration section
    pub fn from_config(config: &RedisConfig) -> Result<Self> {
        Ok(Self::new(open_client(config)?))
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let connection = self
            .connection
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await
            .map_err(|e| ExchangeError::Connection(format!("Redis connection failed: {}", e)))?;

        Ok(connection.clone())
    }
}

#[async_trait]
impl OutboundChannel for RedisClient {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut connection = self.connection().await?;

        let receivers: i64 = connection
            .publish(channel, payload)
            .await
            .map_err(|e| ExchangeError::Publish(e.to_string()))?;

        if receivers == 0 {
            warn!(channel = %channel, "Message published without any subscriber");
        }
        Ok(())
    }
}
