//! Schema resolution

use super::error::ValidationError;
use crate::config::schema::SchemaConfig;
use crate::types::{Origin, RoutingKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves the schema document for an `(origin, routing key)` pair
pub trait SchemaLoader: Send + Sync {
    /// Fails with [`ValidationError::NotFound`] or [`ValidationError::NotConfigured`]
    fn resolve(&self, origin: Origin, routing_key: RoutingKey) -> Result<String, ValidationError>;
}

/// Loads JSON schema files from a directory through a configured mapping
pub struct FileSchemaLoader {
    dir: PathBuf,
    mapping: HashMap<(Origin, RoutingKey), PathBuf>,
    cache: Option<RwLock<HashMap<(Origin, RoutingKey), String>>>,
}

impl FileSchemaLoader {
    /// Create a loader for schema files under `dir` with an empty mapping
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            mapping: HashMap::new(),
            cache: None,
        }
    }

    /// Build a loader from the `schemas` configuration section
    pub fn from_config(config: &SchemaConfig) -> crate::Result<Self> {
        let mut loader = Self::new(&config.dir);

        for (origin_value, routes) in &config.mapping {
            let origin = Origin::from_value(origin_value).ok_or_else(|| {
                crate::Error::Config(format!("unknown origin in schema mapping: {origin_value}"))
            })?;

            for (routing_key_value, file) in routes {
                let routing_key = RoutingKey::from_value(routing_key_value).ok_or_else(|| {
                    crate::Error::Config(format!(
                        "unknown routing key in schema mapping: {routing_key_value}"
                    ))
                })?;

                loader = loader.with_schema(origin, routing_key, file);
            }
        }

        if config.cache {
            loader = loader.with_cache();
        }

        Ok(loader)
    }

    /// Map a pair to a schema file, relative paths are resolved against the directory
    pub fn with_schema<P: AsRef<Path>>(
        mut self,
        origin: Origin,
        routing_key: RoutingKey,
        file: P,
    ) -> Self {
        self.mapping
            .insert((origin, routing_key), self.dir.join(file.as_ref()));
        self
    }

    /// Keep loaded schema documents in memory
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(RwLock::new(HashMap::new()));
        self
    }

    /// Schema directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of mapped pairs
    pub fn mapped_count(&self) -> usize {
        self.mapping.len()
    }
}

impl SchemaLoader for FileSchemaLoader {
    fn resolve(&self, origin: Origin, routing_key: RoutingKey) -> Result<String, ValidationError> {
        let key = (origin, routing_key);

        if let Some(schema) = self.cache.as_ref().and_then(|c| c.read().get(&key).cloned()) {
            return Ok(schema);
        }

        let path = self.mapping.get(&key).ok_or(ValidationError::NotConfigured {
            origin,
            routing_key,
        })?;

        let schema = std::fs::read_to_string(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "Failed to read schema file");
            ValidationError::NotFound {
                origin,
                routing_key,
            }
        })?;

        if let Some(cache) = &self.cache {
            cache.write().insert(key, schema.clone());
        }

        Ok(schema)
    }
}
