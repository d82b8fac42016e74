//! Core types and traits for the Redis DB exchange
//!
//! This crate provides the wire envelope, the module origin and routing key
//! types, schema resolution and validation, the event bus, configuration and
//! logging used by the exchange transport crates.

pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
pub use types::{Origin, RoutingKey};
