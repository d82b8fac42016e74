//! Exchange lifecycle and consumer loop

use crate::base::{ExchangeError, InboundChannel, Result};
use crate::handler::MessageHandler;
use futures::FutureExt;
use parking_lot::RwLock;
use redisdb_exchange_core::config::DEFAULT_CHANNEL;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of an [`Exchange`]
///
/// `Idle -> Subscribed -> Running -> Stopping -> Closed`, there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Subscribed,
    Running,
    Stopping,
    Closed,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeState::Idle => "idle",
            ExchangeState::Subscribed => "subscribed",
            ExchangeState::Running => "running",
            ExchangeState::Stopping => "stopping",
            ExchangeState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Consumes the exchange channel on a background task
///
/// The inbound channel moves into the task on `start`, so an exchange runs
/// once. `stop` only raises a flag; the task unsubscribes, closes the
/// transport and finishes on its next poll.
pub struct Exchange {
    inbound: Option<Box<dyn InboundChannel>>,
    handler: MessageHandler,
    channel: String,
    poll_interval: Duration,
    state: Arc<RwLock<ExchangeState>>,
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Exchange {
    /// Create an exchange reading the default channel
    pub fn new(inbound: Box<dyn InboundChannel>, handler: MessageHandler) -> Self {
        Self {
            inbound: Some(inbound),
            handler,
            channel: DEFAULT_CHANNEL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: Arc::new(RwLock::new(ExchangeState::Idle)),
            stopped: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Read another channel
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Pause between polls when nothing was received
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Subscribe and spawn the consumer loop
    pub async fn start(&mut self) -> Result<()> {
        let state = self.state();
        if state != ExchangeState::Idle {
            return Err(ExchangeError::InvalidState(format!(
                "exchange can only be started once, current state is {}",
                state
            )));
        }

        let mut inbound = self.inbound.take().ok_or_else(|| {
            ExchangeError::InvalidState("inbound channel already taken".to_string())
        })?;

        if let Err(e) = inbound.subscribe(&self.channel).await {
            error!(channel = %self.channel, error = %e, "Exchange could not subscribe");
            // Stays Idle, start may be retried
            self.inbound = Some(inbound);
            return Err(e);
        }
        *self.state.write() = ExchangeState::Subscribed;

        let worker = ExchangeWorker {
            inbound,
            handler: self.handler.clone(),
            poll_interval: self.poll_interval,
            state: Arc::clone(&self.state),
            stopped: Arc::clone(&self.stopped),
        };

        *self.state.write() = ExchangeState::Running;
        self.task = Some(tokio::spawn(worker.run()));

        info!(channel = %self.channel, "Redis DB exchange started");
        Ok(())
    }

    /// Request the consumer loop to stop
    ///
    /// Returns immediately and may be called any number of times.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!("Closing Redis DB exchange");
        }
    }

    /// True while the background task is alive
    pub fn is_healthy(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn state(&self) -> ExchangeState {
        *self.state.read()
    }

    /// Wait for the background task to finish
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Exchange task failed");
            }
        }
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct ExchangeWorker {
    inbound: Box<dyn InboundChannel>,
    handler: MessageHandler,
    poll_interval: Duration,
    state: Arc<RwLock<ExchangeState>>,
    stopped: Arc<AtomicBool>,
}

impl ExchangeWorker {
    async fn run(mut self) {
        while !self.stopped.load(Ordering::SeqCst) {
            match self.inbound.receive().await {
                Ok(Some(raw)) => {
                    // A panicking consumer or listener is a fault like a lost connection
                    let handled = AssertUnwindSafe(self.handler.handle(&raw))
                        .catch_unwind()
                        .await;
                    if handled.is_err() {
                        error!("Exchange message handler panicked");
                        self.stopped.store(true, Ordering::SeqCst);
                    }
                }
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    error!(error = %e, "Exchange connection failed");
                    self.stopped.store(true, Ordering::SeqCst);
                }
            }
        }

        *self.state.write() = ExchangeState::Stopping;

        if let Err(e) = self.inbound.unsubscribe().await {
            debug!(error = %e, "Exchange unsubscribe failed");
        }
        if let Err(e) = self.inbound.close().await {
            debug!(error = %e, "Exchange transport close failed");
        }

        *self.state.write() = ExchangeState::Closed;
        info!("Redis DB exchange was closed");
    }
}
