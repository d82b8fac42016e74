//! Configuration schema definitions

use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default exchange channel name
pub const DEFAULT_CHANNEL: &str = "fb_exchange";

/// Root configuration for the exchange
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Redis connection
    #[serde(default)]
    pub redis: RedisConfig,
    /// Consumer loop tuning
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Schema location and mapping
    #[serde(default)]
    pub schemas: SchemaConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Redis connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: i64,
    /// Pub/sub channel used for publishing and subscribing
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl RedisConfig {
    /// Connection URL in the form `redis://[user[:password]@]host:port/database`
    pub fn url(&self) -> String {
        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => format!("{}:{}@", username, password),
            (Some(username), None) => format!("{}@", username),
            (None, Some(password)) => format!(":{}@", password),
            (None, None) => String::new(),
        };

        format!(
            "redis://{}{}:{}/{}",
            credentials, self.host, self.port, self.database
        )
    }

    /// Replace connection fields from a URL accepted by [`RedisConfig::url`]
    ///
    /// Port and database fall back to 6379 and 0 when the URL omits them.
    /// The channel is not part of the URL and is left untouched.
    pub fn set_url(&mut self, url: &str) -> crate::Result<()> {
        let invalid =
            |reason: &str| Error::Config(format!("Invalid Redis URL '{}': {}", url, reason));

        let rest = url
            .strip_prefix("redis://")
            .ok_or_else(|| invalid("expected redis:// scheme"))?;
        let (credentials, address) = match rest.rsplit_once('@') {
            Some((credentials, address)) => (Some(credentials), address),
            None => (None, rest),
        };
        let (host_port, database) = match address.split_once('/') {
            Some((host_port, "")) => (host_port, 0),
            Some((host_port, database)) => (
                host_port,
                database
                    .parse::<i64>()
                    .map_err(|_| invalid("database must be a number"))?,
            ),
            None => (address, 0),
        };
        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>()
                    .map_err(|_| invalid("port must be a number"))?,
            ),
            None => (host_port, default_port()),
        };
        if host.is_empty() {
            return Err(invalid("host is missing"));
        }

        let (username, password) = match credentials.map(|c| c.split_once(':')) {
            Some(Some((username, password))) => (non_empty(username), non_empty(password)),
            Some(None) => (credentials.and_then(non_empty), None),
            None => (None, None),
        };

        self.host = host.to_string();
        self.port = port;
        self.database = database;
        self.username = username;
        self.password = password;
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            database: 0,
            channel: default_channel(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

/// Consumer loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Pause between polls when no message is waiting
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a single poll waits on the subscription
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Drop messages published by this process
    #[serde(default)]
    pub ignore_own_messages: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            ignore_own_messages: false,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_read_timeout_ms() -> u64 {
    100
}

/// Schema files configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Directory schema files are resolved against
    #[serde(default = "default_schema_dir")]
    pub dir: String,
    /// Keep loaded schema documents in memory
    #[serde(default)]
    pub cache: bool,
    /// origin -> routing key -> schema file
    #[serde(default)]
    pub mapping: HashMap<String, HashMap<String, String>>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            dir: default_schema_dir(),
            cache: false,
            mapping: HashMap::new(),
        }
    }
}

fn default_schema_dir() -> String {
    "schemas".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
