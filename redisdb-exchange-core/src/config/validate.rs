//! Configuration validation rules.

use super::schema::Config;
use crate::types::{Origin, RoutingKey};

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.redis.host.trim().is_empty() {
        errors.push("redis.host must not be empty".to_string());
    }
    if config.redis.port == 0 {
        errors.push("redis.port must be > 0".to_string());
    }
    if config.redis.database < 0 {
        errors.push("redis.database must be >= 0".to_string());
    }
    if config.redis.channel.trim().is_empty() {
        errors.push("redis.channel must not be empty".to_string());
    }

    if config.exchange.poll_interval_ms == 0 {
        errors.push("exchange.poll_interval_ms must be > 0".to_string());
    }
    if config.exchange.read_timeout_ms == 0 {
        errors.push("exchange.read_timeout_ms must be > 0".to_string());
    }

    if config.schemas.dir.trim().is_empty() {
        errors.push("schemas.dir must not be empty".to_string());
    }
    for (origin, routes) in &config.schemas.mapping {
        if Origin::from_value(origin).is_none() {
            errors.push(format!("schemas.mapping has unknown origin '{}'", origin));
        }
        for (routing_key, file) in routes {
            if RoutingKey::from_value(routing_key).is_none() {
                errors.push(format!(
                    "schemas.mapping.{} has unknown routing key '{}'",
                    origin, routing_key
                ));
            }
            if file.trim().is_empty() {
                errors.push(format!(
                    "schemas.mapping.{}.{} must name a schema file",
                    origin, routing_key
                ));
            }
        }
    }

    if !matches!(config.logging.format.to_lowercase().as_str(), "text" | "json") {
        errors.push("logging.format must be 'text' or 'json'".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Config(errors.join("; ")))
    }
}
