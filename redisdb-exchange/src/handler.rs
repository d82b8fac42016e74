//! Processing of a single received exchange message

use redisdb_exchange_core::bus::{
    Envelope, EventDispatcherPtr, ExchangeConsumerPtr, ExchangeEvent, MessageReceivedEvent,
};
use redisdb_exchange_core::schema::{PayloadValidator, ValidationError};
use tracing::{debug, warn};

/// What happened to a received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Validated and handed to the consumer and the dispatcher
    Dispatched,
    /// Envelope could not be decoded
    Invalid,
    /// Payload failed validation
    Rejected(ValidationError),
    /// Sent by this process and filtered out
    Ignored,
}

/// Decodes, validates and delivers raw exchange messages
#[derive(Clone)]
pub struct MessageHandler {
    validator: PayloadValidator,
    consumer: Option<ExchangeConsumerPtr>,
    dispatcher: EventDispatcherPtr,
    ignored_sender: Option<String>,
}

impl MessageHandler {
    /// Create a new message handler
    pub fn new(validator: PayloadValidator, dispatcher: EventDispatcherPtr) -> Self {
        Self {
            validator,
            consumer: None,
            dispatcher,
            ignored_sender: None,
        }
    }

    /// Deliver validated messages to a local consumer before dispatching
    pub fn with_consumer(mut self, consumer: ExchangeConsumerPtr) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Drop messages carrying this sender id
    pub fn ignore_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.ignored_sender = Some(sender_id.into());
        self
    }

    /// Handle one raw message
    ///
    /// Never fails: every problem is logged and reported in the outcome.
    pub async fn handle(&self, raw: &[u8]) -> HandleOutcome {
        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(reason = %e, "Received exchange message is not valid");
                return HandleOutcome::Invalid;
            }
        };

        let origin = envelope.origin();
        let routing_key = envelope.routing_key();

        if self
            .ignored_sender
            .as_deref()
            .is_some_and(|ignored| ignored == envelope.sender_id())
        {
            debug!(
                origin = %origin,
                routing_key = %routing_key,
                sender_id = %envelope.sender_id(),
                "Ignoring own exchange message"
            );
            return HandleOutcome::Ignored;
        }

        let payload = match self.validator.validate(origin, routing_key, envelope.data()) {
            Ok(payload) => payload,
            Err(e) => {
                // Operational failures were already logged by the validator
                if e.is_operational() {
                    debug!(
                        origin = %origin,
                        routing_key = %routing_key,
                        "Dropping message without usable schema"
                    );
                } else {
                    warn!(
                        origin = %origin,
                        routing_key = %routing_key,
                        error = %e,
                        "Received exchange message is not valid"
                    );
                }
                return HandleOutcome::Rejected(e);
            }
        };

        debug!(
            origin = %origin,
            routing_key = %routing_key,
            sender_id = %envelope.sender_id(),
            "Received exchange message"
        );

        if let Some(consumer) = &self.consumer {
            consumer.consume(origin, routing_key, payload.as_map()).await;
        }

        let event = ExchangeEvent::from(MessageReceivedEvent::new(
            origin,
            routing_key,
            payload.into_inner(),
        ));
        self.dispatcher.dispatch(MessageReceivedEvent::EVENT_NAME, event);

        HandleOutcome::Dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use redisdb_exchange_core::bus::{EventBus, EventDispatcher, ExchangeConsumer};
    use redisdb_exchange_core::schema::{JsonSchemaValidator, SchemaLoader};
    use redisdb_exchange_core::{Origin, RoutingKey};
    use serde_json::{json, Map, Value};
    use std::sync::Arc;
    use tracing_test::traced_test;

    const SCHEMA: &str = r#"{
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "required": ["id"]
    }"#;

    struct SingleSchemaLoader;

    impl SchemaLoader for SingleSchemaLoader {
        fn resolve(
            &self,
            origin: Origin,
            routing_key: RoutingKey,
        ) -> Result<String, ValidationError> {
            if (origin, routing_key) == (Origin::DevicesModule, RoutingKey::DevicesEntityUpdated) {
                Ok(SCHEMA.to_string())
            } else {
                Err(ValidationError::NotConfigured {
                    origin,
                    routing_key,
                })
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ExchangeConsumer for Recorder {
        async fn consume(
            &self,
            origin: Origin,
            routing_key: RoutingKey,
            data: &Map<String, Value>,
        ) {
            let data = Value::Object(data.clone());
            self.calls
                .lock()
                .push(format!("consume {} {} {}", origin, routing_key, data));
        }
    }

    impl EventDispatcher for Recorder {
        fn dispatch(&self, event_name: &str, event: ExchangeEvent) {
            let ExchangeEvent::MessageReceived(received) = event;
            self.calls
                .lock()
                .push(format!("dispatch {} {}", event_name, received.routing_key));
        }
    }

    fn handler(recorder: &Arc<Recorder>) -> MessageHandler {
        let validator = PayloadValidator::new(
            Arc::new(SingleSchemaLoader),
            Arc::new(JsonSchemaValidator::new()),
        );
        MessageHandler::new(validator, recorder.clone()).with_consumer(recorder.clone())
    }

    fn message(origin: &str, routing_key: &str, sender_id: &str, data: Value) -> Vec<u8> {
        json!({
            "origin": origin,
            "routing_key": routing_key,
            "sender_id": sender_id,
            "data": data,
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_valid_message_consumed_then_dispatched() {
        let recorder = Arc::new(Recorder::default());
        let outcome = handler(&recorder)
            .handle(&message(
                "devices_module",
                "devices.entity.updated",
                "peer",
                json!({"id": "abc"}),
            ))
            .await;

        assert_eq!(outcome, HandleOutcome::Dispatched);
        assert_eq!(
            *recorder.calls.lock(),
            vec![
                r#"consume devices_module devices.entity.updated {"id":"abc"}"#.to_string(),
                "dispatch exchange.messageReceived devices.entity.updated".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_undecodable_messages_are_invalid() {
        let recorder = Arc::new(Recorder::default());
        let handler = handler(&recorder);

        let unknown_origin = message("spaceship_module", "devices.entity.updated", "", json!({}));
        let unknown_key = message("devices_module", "devices.entity.exploded", "", json!({}));
        let array_data = message("devices_module", "devices.entity.updated", "", json!([1]));

        for raw in [
            unknown_origin,
            unknown_key,
            array_data,
            b"not json".to_vec(),
        ] {
            assert_eq!(handler.handle(&raw).await, HandleOutcome::Invalid);
        }
        assert!(recorder.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failures_are_rejected() {
        let recorder = Arc::new(Recorder::default());
        let handler = handler(&recorder);

        let outcome = handler
            .handle(&message(
                "devices_module",
                "devices.entity.updated",
                "peer",
                json!({"id": 42}),
            ))
            .await;
        assert!(matches!(
            outcome,
            HandleOutcome::Rejected(ValidationError::InvalidData(_))
        ));

        let outcome = handler
            .handle(&message(
                "triggers_module",
                "triggers.entity.created",
                "peer",
                json!({"id": "abc"}),
            ))
            .await;
        assert!(matches!(
            outcome,
            HandleOutcome::Rejected(ValidationError::NotConfigured { .. })
        ));

        assert!(recorder.calls.lock().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_invalid_messages_are_warned() {
        let recorder = Arc::new(Recorder::default());
        let handler = handler(&recorder);

        let unknown_origin = message("spaceship_module", "devices.entity.updated", "", json!({}));
        let scalar_data = message("devices_module", "devices.entity.updated", "", json!("id"));
        let wrong_type = message("devices_module", "devices.entity.updated", "", json!({"id": 1}));

        assert_eq!(handler.handle(&unknown_origin).await, HandleOutcome::Invalid);
        assert!(logs_contain("Received exchange message is not valid"));

        assert_eq!(handler.handle(&scalar_data).await, HandleOutcome::Invalid);
        assert!(matches!(
            handler.handle(&wrong_type).await,
            HandleOutcome::Rejected(ValidationError::InvalidData(_))
        ));

        logs_assert(|lines: &[&str]| {
            let warned = lines
                .iter()
                .filter(|line| {
                    line.contains("WARN") && line.contains("Received exchange message is not valid")
                })
                .count();
            match warned {
                3 => Ok(()),
                n => Err(format!("expected 3 invalid message warnings, got {}", n)),
            }
        });
        assert!(!logs_contain("ERROR"));
    }

    #[tokio::test]
    async fn test_own_messages_ignored() {
        let recorder = Arc::new(Recorder::default());
        let handler = handler(&recorder).ignore_sender("me");

        let own = message("devices_module", "devices.entity.updated", "me", json!({"id": "a"}));
        let peer = message("devices_module", "devices.entity.updated", "peer", json!({"id": "b"}));

        assert_eq!(handler.handle(&own).await, HandleOutcome::Ignored);
        assert_eq!(handler.handle(&peer).await, HandleOutcome::Dispatched);
        assert_eq!(recorder.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_without_consumer() {
        let bus = EventBus::new();
        let validator = PayloadValidator::new(
            Arc::new(SingleSchemaLoader),
            Arc::new(JsonSchemaValidator::new()),
        );
        let handler = MessageHandler::new(validator, Arc::new(bus.clone()));

        let outcome = handler
            .handle(&message(
                "devices_module",
                "devices.entity.updated",
                "peer",
                json!({"id": "abc"}),
            ))
            .await;

        assert_eq!(outcome, HandleOutcome::Dispatched);
        assert_eq!(bus.events_dispatched(), 1);
    }
}
