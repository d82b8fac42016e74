use async_trait::async_trait;
use parking_lot::Mutex;
use redisdb_exchange::{
    Exchange, ExchangeError, ExchangePublisher, ExchangeState, InboundChannel, MemoryBroker,
    MessageHandler, OutboundChannel, Publisher,
};
use redisdb_exchange_core::bus::{EventDispatcher, ExchangeConsumer, ExchangeEvent};
use redisdb_exchange_core::schema::{FileSchemaLoader, JsonSchemaValidator, PayloadValidator};
use redisdb_exchange_core::{Origin, RoutingKey};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout, Instant};

const DEVICE_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "type": "object",
    "properties": {
        "id": {"type": "string"},
        "name": {"type": "string"}
    },
    "required": ["id"]
}"#;

/// Consumer and dispatcher writing into one shared log, so call order is visible
#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<String>>,
}

impl Recorder {
    fn entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl ExchangeConsumer for Recorder {
    async fn consume(&self, origin: Origin, routing_key: RoutingKey, data: &Map<String, Value>) {
        self.log.lock().push(format!(
            "consume {} {} {}",
            origin,
            routing_key,
            Value::Object(data.clone())
        ));
    }
}

impl EventDispatcher for Recorder {
    fn dispatch(&self, event_name: &str, event: ExchangeEvent) {
        let ExchangeEvent::MessageReceived(received) = event;
        self.log.lock().push(format!(
            "dispatch {} {} {}",
            event_name,
            received.routing_key,
            Value::Object(received.data)
        ));
    }
}

struct Harness {
    schemas: TempDir,
    broker: MemoryBroker,
    recorder: Arc<Recorder>,
    exchange: Exchange,
}

impl Harness {
    fn new() -> Self {
        Self::with_handler(|handler| handler)
    }

    fn with_handler(configure: impl FnOnce(MessageHandler) -> MessageHandler) -> Self {
        let schemas = TempDir::new().unwrap();
        std::fs::write(schemas.path().join("device.json"), DEVICE_SCHEMA).unwrap();
        std::fs::write(schemas.path().join("broken.json"), "{ not a schema").unwrap();

        let loader = FileSchemaLoader::new(schemas.path())
            .with_schema(
                Origin::DevicesModule,
                RoutingKey::DevicesEntityUpdated,
                "device.json",
            )
            .with_schema(
                Origin::DevicesModule,
                RoutingKey::DevicesEntityDeleted,
                "broken.json",
            )
            .with_schema(
                Origin::DevicesModule,
                RoutingKey::DevicesEntityCreated,
                "missing.json",
            );
        let validator =
            PayloadValidator::new(Arc::new(loader), Arc::new(JsonSchemaValidator::new()));

        let recorder = Arc::new(Recorder::default());
        let handler = configure(
            MessageHandler::new(validator, recorder.clone()).with_consumer(recorder.clone()),
        );

        let broker = MemoryBroker::new();
        let inbound = broker
            .subscription()
            .with_read_timeout(Duration::from_millis(2));
        let exchange = Exchange::new(Box::new(inbound), handler);

        Self {
            schemas,
            broker,
            recorder,
            exchange,
        }
    }

    async fn send_raw(&self, payload: &str) {
        self.broker
            .client()
            .publish("fb_exchange", payload)
            .await
            .unwrap();
    }

    async fn send(&self, origin: &str, routing_key: &str, data: Value) {
        let payload = json!({
            "origin": origin,
            "routing_key": routing_key,
            "sender_id": "peer",
            "data": data,
        });
        self.send_raw(&payload.to_string()).await;
    }

    async fn wait_for_entries(&self, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while self.recorder.entries().len() < count {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {} entries, got {:?}",
                count,
                self.recorder.entries()
            );
            sleep(Duration::from_millis(5)).await;
        }
    }

    async fn shutdown(&mut self) {
        self.exchange.stop();
        timeout(Duration::from_secs(2), self.exchange.join())
            .await
            .unwrap();
    }
}

async fn wait_until_unhealthy(exchange: &Exchange) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while exchange.is_healthy() {
        assert!(Instant::now() < deadline, "exchange is still healthy");
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn valid_message_is_consumed_before_dispatch() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();

    harness
        .send(
            "devices_module",
            "devices.entity.updated",
            json!({"id": "device-1", "name": "Thermostat"}),
        )
        .await;
    harness.wait_for_entries(2).await;

    assert_eq!(
        harness.recorder.entries(),
        vec![
            r#"consume devices_module devices.entity.updated {"id":"device-1","name":"Thermostat"}"#
                .to_string(),
            r#"dispatch exchange.messageReceived devices.entity.updated {"id":"device-1","name":"Thermostat"}"#
                .to_string(),
        ]
    );

    harness.shutdown().await;
}

#[tokio::test]
async fn malformed_messages_are_dropped_and_loop_survives() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();

    harness.send_raw("definitely not json").await;
    harness.send_raw("[1, 2, 3]").await;
    harness
        .send("spaceship_module", "devices.entity.updated", json!({"id": "a"}))
        .await;
    harness
        .send("devices_module", "devices.entity.exploded", json!({"id": "a"}))
        .await;
    harness
        .send("devices_module", "devices.entity.updated", json!("a string"))
        .await;
    harness
        .send_raw(r#"{"origin":"devices_module","routing_key":"devices.entity.updated"}"#)
        .await;

    // A valid message after the bad ones proves they were all skipped
    harness
        .send("devices_module", "devices.entity.updated", json!({"id": "ok"}))
        .await;
    harness.wait_for_entries(2).await;

    let entries = harness.recorder.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].contains(r#"{"id":"ok"}"#));
    assert!(harness.exchange.is_healthy());

    harness.shutdown().await;
}

#[tokio::test]
async fn schema_and_validation_failures_keep_exchange_running() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();

    // Not configured in mapping
    harness
        .send("triggers_module", "triggers.entity.created", json!({"id": "t"}))
        .await;
    // Mapped, file missing
    harness
        .send("devices_module", "devices.entity.created", json!({"id": "d"}))
        .await;
    // Mapped, schema does not parse
    harness
        .send("devices_module", "devices.entity.deleted", json!({"id": "d"}))
        .await;
    // Fails the schema
    harness
        .send("devices_module", "devices.entity.updated", json!({"name": "no id"}))
        .await;

    harness
        .send("devices_module", "devices.entity.updated", json!({"id": "last"}))
        .await;
    harness.wait_for_entries(2).await;

    let entries = harness.recorder.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].contains(r#"{"id":"last"}"#));
    assert!(harness.exchange.is_healthy());
    assert_eq!(harness.exchange.state(), ExchangeState::Running);

    harness.shutdown().await;
}

#[tokio::test]
async fn messages_are_handled_in_arrival_order() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();

    for index in 0..5 {
        harness
            .send(
                "devices_module",
                "devices.entity.updated",
                json!({"id": format!("device-{}", index)}),
            )
            .await;
    }
    harness.wait_for_entries(10).await;

    let consumed: Vec<String> = harness
        .recorder
        .entries()
        .into_iter()
        .filter(|entry| entry.starts_with("consume"))
        .collect();
    for (index, entry) in consumed.iter().enumerate() {
        assert!(entry.contains(&format!("device-{}", index)), "{}", entry);
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn transport_failure_closes_exchange() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();
    assert!(harness.exchange.is_healthy());

    harness.broker.disconnect();
    wait_until_unhealthy(&harness.exchange).await;

    assert_eq!(harness.exchange.state(), ExchangeState::Closed);
    assert_eq!(harness.broker.subscriber_count(), 0);
    assert!(harness.recorder.entries().is_empty());

    // Stopping a dead exchange is harmless
    harness.exchange.stop();
    harness.exchange.join().await;
}

/// Consumer that blows up on every message
struct PanickingConsumer;

#[async_trait]
impl ExchangeConsumer for PanickingConsumer {
    async fn consume(&self, _origin: Origin, _routing_key: RoutingKey, _data: &Map<String, Value>) {
        panic!("consumer bug");
    }
}

#[tokio::test]
async fn consumer_panic_closes_exchange_cleanly() {
    let mut harness =
        Harness::with_handler(|handler| handler.with_consumer(Arc::new(PanickingConsumer)));
    harness.exchange.start().await.unwrap();
    assert_eq!(harness.broker.subscriber_count(), 1);

    harness
        .send("devices_module", "devices.entity.updated", json!({"id": "boom"}))
        .await;
    wait_until_unhealthy(&harness.exchange).await;

    assert_eq!(harness.exchange.state(), ExchangeState::Closed);
    assert_eq!(harness.broker.subscriber_count(), 0);
    assert!(harness.recorder.entries().is_empty());

    timeout(Duration::from_secs(2), harness.exchange.join())
        .await
        .unwrap();
}

#[tokio::test]
async fn stop_is_idempotent() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();

    harness.exchange.stop();
    harness.exchange.stop();
    harness.shutdown().await;
    harness.exchange.stop();

    assert_eq!(harness.exchange.state(), ExchangeState::Closed);
    assert!(!harness.exchange.is_healthy());
}

#[tokio::test]
async fn exchange_cannot_restart() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();
    harness.shutdown().await;

    let err = harness.exchange.start().await.unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidState(_)));
}

#[tokio::test]
async fn own_messages_are_ignored_when_configured() {
    let mut harness = Harness::with_handler(|handler| handler.ignore_sender("local-sender"));
    harness.exchange.start().await.unwrap();

    let local = Publisher::new(Arc::new(harness.broker.client()), "local-sender");
    let peer = Publisher::new(Arc::new(harness.broker.client()), "peer-sender");
    let data = json!({"id": "device-1"}).as_object().cloned().unwrap();

    local
        .publish(
            Origin::DevicesModule,
            RoutingKey::DevicesEntityUpdated,
            data.clone(),
        )
        .await
        .unwrap();
    peer.publish(Origin::DevicesModule, RoutingKey::DevicesEntityUpdated, data)
        .await
        .unwrap();
    harness.wait_for_entries(2).await;

    assert_eq!(harness.recorder.entries().len(), 2);
    assert_eq!(harness.broker.published().len(), 2);

    harness.shutdown().await;
}

#[tokio::test]
async fn published_message_round_trips_through_exchange() {
    let mut harness = Harness::new();
    harness.exchange.start().await.unwrap();

    let publisher = Publisher::new(
        Arc::new(harness.broker.client()),
        "11111111-1111-1111-1111-111111111111",
    );
    let data = json!({"id": "device-1"}).as_object().cloned().unwrap();
    publisher
        .publish(Origin::DevicesModule, RoutingKey::DevicesEntityUpdated, data)
        .await
        .unwrap();
    harness.wait_for_entries(2).await;

    assert!(harness.recorder.entries()[0]
        .starts_with("consume devices_module devices.entity.updated"));

    harness.shutdown().await;
}

/// Inbound channel replaying scripted reads and recording lifecycle calls
struct ScriptedInbound {
    reads: VecDeque<Result<Option<Vec<u8>>, ExchangeError>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl InboundChannel for ScriptedInbound {
    async fn subscribe(&mut self, _channel: &str) -> redisdb_exchange::Result<()> {
        self.calls.lock().push("subscribe");
        Ok(())
    }

    async fn receive(&mut self) -> redisdb_exchange::Result<Option<Vec<u8>>> {
        self.reads.pop_front().unwrap_or(Ok(None))
    }

    async fn unsubscribe(&mut self) -> redisdb_exchange::Result<()> {
        self.calls.lock().push("unsubscribe");
        Ok(())
    }

    async fn close(&mut self) -> redisdb_exchange::Result<()> {
        self.calls.lock().push("close");
        Ok(())
    }
}

#[tokio::test]
async fn read_error_unsubscribes_then_closes() {
    let harness = Harness::new();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let inbound = ScriptedInbound {
        reads: VecDeque::from(vec![
            Ok(None),
            Err(ExchangeError::Connection("connection reset".to_string())),
        ]),
        calls: Arc::clone(&calls),
    };

    let validator = PayloadValidator::new(
        Arc::new(FileSchemaLoader::new(harness.schemas.path())),
        Arc::new(JsonSchemaValidator::new()),
    );
    let mut exchange = Exchange::new(
        Box::new(inbound),
        MessageHandler::new(validator, harness.recorder.clone()),
    )
    .with_poll_interval(Duration::from_millis(2));

    exchange.start().await.unwrap();
    timeout(Duration::from_secs(2), exchange.join()).await.unwrap();

    assert_eq!(*calls.lock(), vec!["subscribe", "unsubscribe", "close"]);
    assert_eq!(exchange.state(), ExchangeState::Closed);
    assert!(!exchange.is_healthy());
}
