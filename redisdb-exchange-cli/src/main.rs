//! CLI entry point for the Redis DB exchange

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use console::style;
use redisdb_exchange::{
    Exchange, ExchangePublisher, MessageHandler, Publisher, RedisClient, RedisSubscription,
};
use redisdb_exchange_core::bus::{EventBus, ExchangeConsumer, MessageReceivedEvent};
use redisdb_exchange_core::config::{Config, ConfigLoader};
use redisdb_exchange_core::logging::init_logging;
use redisdb_exchange_core::schema::{FileSchemaLoader, JsonSchemaValidator, PayloadValidator};
use redisdb_exchange_core::{Origin, RoutingKey};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "redisdb-exchange")]
#[command(about = "Exchange messages between services over Redis pub/sub")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Sender id stamped on published messages, random when omitted
    #[arg(short, long, global = true)]
    sender_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume the exchange channel until Ctrl+C
    Listen,
    /// Publish one message
    Publish {
        /// Origin module (e.g. 'devices_module')
        #[arg(short, long)]
        origin: String,
        /// Routing key (e.g. 'devices.entity.updated')
        #[arg(short, long)]
        routing_key: String,
        /// JSON object payload
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
    /// Validate a payload against its configured schema
    Validate {
        /// Origin module
        #[arg(short, long)]
        origin: String,
        /// Routing key
        #[arg(short, long)]
        routing_key: String,
        /// JSON object payload
        #[arg(short, long)]
        data: String,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };
    let config = config_loader.load().with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_loader.config_dir().display()
        )
    })?;

    let _log_guard = init_logging(&config.logging);
    let sender_id = cli.sender_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    match cli.command {
        Commands::Listen => {
            info!("Starting exchange listener");
            run_listen(&config, sender_id).await?;
        }
        Commands::Publish {
            origin,
            routing_key,
            data,
        } => {
            run_publish(&config, sender_id, &origin, &routing_key, &data).await?;
        }
        Commands::Validate {
            origin,
            routing_key,
            data,
        } => {
            run_validate(&config, &origin, &routing_key, &data)?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
        }
    }

    Ok(())
}

/// Logs every validated message
struct LoggingConsumer;

#[async_trait]
impl ExchangeConsumer for LoggingConsumer {
    async fn consume(&self, origin: Origin, routing_key: RoutingKey, data: &Map<String, Value>) {
        info!(
            origin = %origin,
            routing_key = %routing_key,
            fields = data.len(),
            "Exchange message consumed"
        );
    }
}

async fn run_listen(config: &Config, sender_id: String) -> Result<()> {
    println!("{}", style("Starting Redis DB exchange...").bold().cyan());

    let bus = EventBus::new();
    bus.subscribe(MessageReceivedEvent::EVENT_NAME, |event| {
        match serde_json::to_string(event) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "Event could not be printed"),
        }
    });

    let mut handler = MessageHandler::new(build_validator(config)?, Arc::new(bus.clone()))
        .with_consumer(Arc::new(LoggingConsumer));
    if config.exchange.ignore_own_messages {
        handler = handler.ignore_sender(sender_id);
    }

    let inbound = RedisSubscription::from_config(&config.redis, &config.exchange)?;
    let mut exchange = Exchange::new(Box::new(inbound), handler)
        .with_channel(&config.redis.channel)
        .with_poll_interval(Duration::from_millis(config.exchange.poll_interval_ms));

    exchange.start().await?;
    println!(
        "{}",
        style("Exchange is running. Press Ctrl+C to stop.").green()
    );

    let result = supervise(&mut exchange, tokio::signal::ctrl_c()).await;

    println!(
        "{} ({} messages received)",
        style("Exchange stopped.").green(),
        bus.events_dispatched()
    );
    result
}

/// Keep the exchange running until `shutdown` resolves, then stop it
///
/// Fails when the exchange dies on its own, e.g. after losing the Redis
/// connection.
async fn supervise<F>(exchange: &mut Exchange, shutdown: F) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    let mut shutdown = std::pin::pin!(shutdown);
    let mut health = tokio::time::interval(Duration::from_millis(500));
    let mut died = false;
    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                println!("\n{}", style("Shutting down...").yellow());
                break;
            }
            _ = health.tick() => {
                if !exchange.is_healthy() {
                    warn!(state = %exchange.state(), "Exchange stopped unexpectedly");
                    died = true;
                    break;
                }
            }
        }
    }

    exchange.stop();
    exchange.join().await;

    if died {
        bail!("Exchange stopped unexpectedly, see the log for the cause");
    }
    Ok(())
}

async fn run_publish(
    config: &Config,
    sender_id: String,
    origin: &str,
    routing_key: &str,
    data: &str,
) -> Result<()> {
    let origin = parse_origin(origin)?;
    let routing_key = parse_routing_key(routing_key)?;
    let data = parse_data(data)?;

    let client = RedisClient::from_config(&config.redis)?;
    let publisher =
        Publisher::new(Arc::new(client), sender_id).with_channel(&config.redis.channel);

    publisher.publish(origin, routing_key, data).await?;

    println!(
        "{} {} from {} on {}",
        style("Published").green().bold(),
        routing_key,
        origin,
        publisher.channel()
    );
    Ok(())
}

fn run_validate(config: &Config, origin: &str, routing_key: &str, data: &str) -> Result<()> {
    let origin = parse_origin(origin)?;
    let routing_key = parse_routing_key(routing_key)?;
    let data = parse_data(data)?;

    match build_validator(config)?.validate(origin, routing_key, &data) {
        Ok(payload) => {
            println!(
                "{} {}",
                style("Valid").green().bold(),
                serde_json::to_string(payload.as_map())?
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", style("Invalid").red().bold(), e);
            Err(redisdb_exchange_core::Error::from(e).into())
        }
    }
}

fn build_validator(config: &Config) -> Result<PayloadValidator> {
    let loader = FileSchemaLoader::from_config(&config.schemas)?;
    info!(
        dir = %loader.dir().display(),
        schemas = loader.mapped_count(),
        "Schema loader ready"
    );
    Ok(PayloadValidator::new(
        Arc::new(loader),
        Arc::new(JsonSchemaValidator::new()),
    ))
}

fn parse_origin(value: &str) -> Result<Origin> {
    Origin::from_value(value).ok_or_else(|| anyhow!("Unknown origin '{}'", value))
}

fn parse_routing_key(value: &str) -> Result<RoutingKey> {
    RoutingKey::from_value(value).ok_or_else(|| anyhow!("Unknown routing key '{}'", value))
}

fn parse_data(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).context("Payload is not valid JSON")? {
        Value::Object(data) => Ok(data),
        _ => bail!("Payload must be a JSON object"),
    }
}

/// Copy of the configuration safe to print
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.redis.password.is_some() {
        config.redis.password = Some("********".to_string());
    }
    config
}
