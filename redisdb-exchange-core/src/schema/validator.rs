//! JSON schema validation

use super::error::ValidationError;
use serde_json::{Map, Value};

/// Validates JSON text against a schema document
pub trait SchemaValidator: Send + Sync {
    /// Fails with [`ValidationError::MalformedInput`],
    /// [`ValidationError::CompileFailure`] or [`ValidationError::InvalidData`]
    fn validate(
        &self,
        json_text: &str,
        schema: &str,
    ) -> Result<Map<String, Value>, ValidationError>;
}

/// [`SchemaValidator`] backed by the `jsonschema` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(
        &self,
        json_text: &str,
        schema: &str,
    ) -> Result<Map<String, Value>, ValidationError> {
        let instance: Value = serde_json::from_str(json_text)
            .map_err(|e| ValidationError::MalformedInput(e.to_string()))?;

        let schema: Value = serde_json::from_str(schema)
            .map_err(|e| ValidationError::CompileFailure(e.to_string()))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| ValidationError::CompileFailure(e.to_string()))?;

        if let Err(error) = validator.validate(&instance) {
            return Err(ValidationError::InvalidData(error.to_string()));
        }

        match instance {
            Value::Object(data) => Ok(data),
            _ => Err(ValidationError::MalformedInput(
                "top level value is not an object".to_string(),
            )),
        }
    }
}
