//! Configuration loading

use super::schema::Config;
use super::validate::validate_config;
use crate::Error;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "REDISDB_EXCHANGE__";

/// Short variables commonly set by deployments, applied in this order
/// before the prefixed ones. `REDIS_URL` comes first so the single field
/// aliases can refine it.
const REDIS_ALIASES: [(&str, &str); 6] = [
    ("REDIS_URL", "redis__url"),
    ("REDIS_HOST", "redis__host"),
    ("REDIS_PORT", "redis__port"),
    ("REDIS_USERNAME", "redis__username"),
    ("REDIS_PASSWORD", "redis__password"),
    ("REDIS_CHANNEL", "redis__channel"),
];

/// Reads `config.json` from a configuration directory and layers
/// environment overrides on top
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader for the platform configuration directory
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .map(|dir| dir.join("redisdb-exchange"))
            .unwrap_or_else(|| PathBuf::from(".redisdb-exchange"));

        Self { config_dir }
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load using the process environment
    pub fn load(&self) -> crate::Result<Config> {
        self.load_with_env(std::env::vars())
    }

    /// Load using the given variables in place of the process environment
    ///
    /// Precedence, lowest first: defaults, `config.json`, `REDIS_*` aliases,
    /// `REDISDB_EXCHANGE__SECTION__KEY` variables. A relative `schemas.dir`
    /// is resolved against the configuration directory.
    pub fn load_with_env<I, K, V>(&self, vars: I) -> crate::Result<Config>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        let mut config = self.read_file()?;
        let mut errors = Vec::new();

        for (name, field) in REDIS_ALIASES {
            if let Some(value) = vars.get(name) {
                if let Err(e) = apply_override(&mut config, field, value) {
                    errors.push(format!("{}: {}", name, e));
                }
            }
        }

        for (name, value) in &vars {
            let Some(field) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if let Err(e) = apply_override(&mut config, &field.to_ascii_lowercase(), value) {
                errors.push(format!("{}: {}", name, e));
            }
        }

        if !errors.is_empty() {
            return Err(Error::Config(format!(
                "Invalid environment overrides:\n  - {}",
                errors.join("\n  - ")
            )));
        }

        validate_config(&config)?;
        self.resolve_schema_dir(&mut config);
        Ok(config)
    }

    /// Write `config.json`, creating the directory if needed
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.config_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }

    fn read_file(&self) -> crate::Result<Config> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn resolve_schema_dir(&self, config: &mut Config) {
        let dir = Path::new(&config.schemas.dir);
        if dir.is_relative() {
            config.schemas.dir = self.config_dir.join(dir).to_string_lossy().into_owned();
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Set one field from its `section__key` name
fn apply_override(config: &mut Config, field: &str, value: &str) -> Result<(), String> {
    let redis = &mut config.redis;
    let exchange = &mut config.exchange;
    let schemas = &mut config.schemas;
    let logging = &mut config.logging;

    match field {
        "redis__url" => redis.set_url(value).map_err(|e| e.to_string())?,
        "redis__host" => redis.host = value.to_string(),
        "redis__port" => redis.port = parse(value)?,
        "redis__username" => redis.username = optional(value),
        "redis__password" => redis.password = optional(value),
        "redis__database" => redis.database = parse(value)?,
        "redis__channel" => redis.channel = value.to_string(),
        "exchange__poll_interval_ms" => exchange.poll_interval_ms = parse(value)?,
        "exchange__read_timeout_ms" => exchange.read_timeout_ms = parse(value)?,
        "exchange__ignore_own_messages" => exchange.ignore_own_messages = flag(value)?,
        "schemas__dir" => schemas.dir = value.to_string(),
        "schemas__cache" => schemas.cache = flag(value)?,
        "logging__level" => logging.level = value.to_string(),
        "logging__format" => logging.format = value.to_string(),
        "logging__dir" => logging.dir = value.to_string(),
        _ => warn!(field = %field, "Unknown configuration override ignored"),
    }
    Ok(())
}

fn parse<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("'{}' is not valid: {}", value, e))
}

fn flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("'{}' is not a boolean", value)),
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
