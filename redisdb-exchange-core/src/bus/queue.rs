//! In-process event bus

use super::events::ExchangeEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Sink for exchange events
///
/// Dispatching is fire-and-forget: the exchange never waits for, or reacts
/// to, what listeners do with an event.
pub trait EventDispatcher: Send + Sync {
    /// Dispatch an event under the given name
    fn dispatch(&self, event_name: &str, event: ExchangeEvent);
}

/// Shared event dispatcher handle
pub type EventDispatcherPtr = Arc<dyn EventDispatcher>;

type EventListener = Arc<dyn Fn(&ExchangeEvent) + Send + Sync>;

/// Event bus delivering events to listeners registered by event name
///
/// Listeners run synchronously on the dispatching task, in registration
/// order, so they should hand heavy work off elsewhere.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<String, Vec<EventListener>>>>,
    dispatched: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for an event name
    pub fn subscribe<F>(&self, event_name: impl Into<String>, listener: F)
    where
        F: Fn(&ExchangeEvent) + Send + Sync + 'static,
    {
        let event_name = event_name.into();
        debug!(event = %event_name, "Registering event listener");

        self.listeners
            .write()
            .entry(event_name)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Number of listeners registered for an event name
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .read()
            .get(event_name)
            .map_or(0, |listeners| listeners.len())
    }

    /// Total number of events dispatched through this bus
    pub fn events_dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}

impl EventDispatcher for EventBus {
    fn dispatch(&self, event_name: &str, event: ExchangeEvent) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);

        // Clone the handles so listeners may subscribe while being called
        let listeners = self.listeners.read().get(event_name).cloned();

        match listeners {
            Some(listeners) => {
                for listener in listeners {
                    listener(&event);
                }
            }
            None => debug!(event = %event_name, "No listeners for event"),
        }
    }
}
