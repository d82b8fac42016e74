//! Validation error kinds

use crate::types::{Origin, RoutingKey};
use thiserror::Error;

/// Why a payload could not be validated
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Schema file for the pair is missing or unreadable
    #[error("Schema file for origin: {origin} and routing key: {routing_key} could not be loaded")]
    NotFound {
        origin: Origin,
        routing_key: RoutingKey,
    },

    /// The pair has no schema in the mapping
    #[error("Schema file for origin: {origin} and routing key: {routing_key} is not configured in mapping")]
    NotConfigured {
        origin: Origin,
        routing_key: RoutingKey,
    },

    /// The payload text is not a well formed JSON object
    #[error("Provided data are not in valid json format: {0}")]
    MalformedInput(String),

    /// The schema document could not be parsed or compiled
    #[error("Schema could not be parsed & compiled: {0}")]
    CompileFailure(String),

    /// The payload does not satisfy the schema
    #[error("Provided data are not valid: {0}")]
    InvalidData(String),
}

impl ValidationError {
    /// Schema resolution failed (missing file or missing mapping)
    pub fn is_schema_unavailable(&self) -> bool {
        matches!(
            self,
            ValidationError::NotFound { .. } | ValidationError::NotConfigured { .. }
        )
    }

    /// Failure caused by deployment or configuration rather than by the producer
    pub fn is_operational(&self) -> bool {
        self.is_schema_unavailable() || matches!(self, ValidationError::CompileFailure(_))
    }
}
