//! Two-stage validation of received payloads

use super::error::ValidationError;
use super::loader::SchemaLoader;
use super::validator::SchemaValidator;
use crate::types::{Origin, RoutingKey};
use serde_json::{Map, Value};
use std::ops::Deref;
use std::sync::Arc;
use tracing::error;

/// A payload that passed schema validation
///
/// Only [`PayloadValidator`] constructs it, so holding one means the content
/// matched the schema for its origin and routing key.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload(Map<String, Value>);

impl ValidatedPayload {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Deref for ValidatedPayload {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Resolves the schema for a message and validates its data against it
#[derive(Clone)]
pub struct PayloadValidator {
    loader: Arc<dyn SchemaLoader>,
    validator: Arc<dyn SchemaValidator>,
}

impl PayloadValidator {
    /// Create a new payload validator
    pub fn new(loader: Arc<dyn SchemaLoader>, validator: Arc<dyn SchemaValidator>) -> Self {
        Self { loader, validator }
    }

    /// Validate `data` against the schema of `(origin, routing_key)`
    ///
    /// Resolution and compile failures are logged here at error level since
    /// they point at deployment problems. Content failures are only returned.
    pub fn validate(
        &self,
        origin: Origin,
        routing_key: RoutingKey,
        data: &Map<String, Value>,
    ) -> Result<ValidatedPayload, ValidationError> {
        let schema = match self.loader.resolve(origin, routing_key) {
            Ok(schema) => schema,
            Err(err) => {
                match &err {
                    ValidationError::NotConfigured { .. } => error!(
                        origin = %origin,
                        routing_key = %routing_key,
                        "Schema file is not configured in mapping"
                    ),
                    _ => error!(
                        origin = %origin,
                        routing_key = %routing_key,
                        error = %err,
                        "Schema file could not be loaded"
                    ),
                }
                return Err(err);
            }
        };

        let json_text = serde_json::to_string(data)
            .map_err(|e| ValidationError::MalformedInput(e.to_string()))?;

        match self.validator.validate(&json_text, &schema) {
            Ok(data) => Ok(ValidatedPayload(data)),
            Err(err @ ValidationError::CompileFailure(_)) => {
                error!(
                    origin = %origin,
                    routing_key = %routing_key,
                    error = %err,
                    "Schema file could not be parsed & compiled"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}
