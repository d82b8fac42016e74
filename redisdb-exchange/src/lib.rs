//! Redis DB exchange
//!
//! Bridges services over a single Redis pub/sub channel. The [`Publisher`]
//! sends envelopes stamped with this process' sender id, the [`Exchange`]
//! consumes the channel on a background task, validates every payload
//! against its schema and hands it to the local consumer and event bus.

pub mod base;
pub mod exchange;
pub mod handler;
pub mod memory;
pub mod publisher;
pub mod redisdb;

pub use base::{ExchangeError, InboundChannel, OutboundChannel, OutboundChannelPtr, Result};
pub use exchange::{Exchange, ExchangeState};
pub use handler::{HandleOutcome, MessageHandler};
pub use memory::{MemoryBroker, MemoryClient, MemorySubscription};
pub use publisher::{ExchangePublisher, Publisher};
pub use redisdb::{RedisClient, RedisSubscription};
