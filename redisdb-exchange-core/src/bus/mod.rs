//! Exchange bus types
//!
//! The wire envelope and its codec, the events raised for received
//! messages, the in-process event bus and the local consumer interface.

pub mod consumer;
pub mod envelope;
pub mod events;
pub mod queue;

pub use consumer::{ExchangeConsumer, ExchangeConsumerPtr};
pub use envelope::{DecodeError, Envelope};
pub use events::{ExchangeEvent, MessageReceivedEvent};
pub use queue::{EventBus, EventDispatcher, EventDispatcherPtr};
