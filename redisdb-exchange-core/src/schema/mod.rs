//! Schema resolution and payload validation
//!
//! Received payloads are validated in two stages: the schema for the
//! `(origin, routing key)` pair is resolved by a [`SchemaLoader`], then the
//! payload is checked against it by a [`SchemaValidator`]. The
//! [`PayloadValidator`] ties both together and logs operational failures.

pub mod error;
pub mod loader;
pub mod payload;
pub mod validator;

pub use error::ValidationError;
pub use loader::{FileSchemaLoader, SchemaLoader};
pub use payload::{PayloadValidator, ValidatedPayload};
pub use validator::{JsonSchemaValidator, SchemaValidator};
