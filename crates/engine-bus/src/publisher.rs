//! # Event Publisher
//!
//! Defines the emitting side of the output bus.

use crate::events::OutputEvent;
use crate::subscriber::Subscription;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Live subscriptions by event name.
pub(crate) type SubscriberMap = RwLock<HashMap<String, Vec<SubscriberSlot>>>;

/// Sending half of one subscription.
pub(crate) struct SubscriberSlot {
    pub(crate) id: u64,
    pub(crate) sender: mpsc::UnboundedSender<OutputEvent>,
}

/// Trait for emitting output events.
///
/// The sidecar host depends on this rather than on the concrete bus so the
/// stdout pump can be pointed at any sink.
#[async_trait]
pub trait OutputPublisher: Send + Sync {
    /// Emit an event.
    ///
    /// # Returns
    ///
    /// The number of active subscriptions that received the event.
    async fn publish(&self, event: OutputEvent) -> usize;
}

/// In-memory output bus.
///
/// Every subscription owns an unbounded queue, so a subscriber that falls
/// behind sees every event later instead of losing some. Events are routed
/// by name on the emitting side.
pub struct OutputEventBus {
    /// Live subscriptions by event name.
    subscriptions: Arc<SubscriberMap>,

    /// Id handed to the next subscription.
    next_id: AtomicU64,
}

impl OutputEventBus {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Subscribe to events carrying `name`.
    ///
    /// The subscription only sees events emitted after this call returns.
    #[must_use]
    pub fn subscribe(&self, name: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut subs) = self.subscriptions.write() {
            subs.entry(name.to_string())
                .or_default()
                .push(SubscriberSlot { id, sender });
        }

        debug!(event = name, id, "New output subscription created");

        Subscription::new(
            receiver,
            name.to_string(),
            id,
            Arc::downgrade(&self.subscriptions),
        )
    }

    /// Emit a payload under `name`.
    ///
    /// Returns the number of subscriptions the event reached (0 when nobody
    /// is listening, in which case the event is dropped).
    pub fn emit(&self, name: &str, payload: impl Into<String>) -> usize {
        self.send(OutputEvent::new(name, payload))
    }

    /// Number of live subscriptions for an event name.
    #[must_use]
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscriptions
            .read()
            .map(|subs| subs.get(name).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn send(&self, event: OutputEvent) -> usize {
        let Ok(subs) = self.subscriptions.read() else {
            return 0;
        };
        let Some(slots) = subs.get(&event.name) else {
            debug!(event = %event.name, bytes = event.len(), "Output event dropped (no subscribers)");
            return 0;
        };

        let delivered = slots
            .iter()
            .filter(|slot| slot.sender.send(event.clone()).is_ok())
            .count();
        trace!(event = %event.name, bytes = event.len(), delivered, "Output event emitted");
        delivered
    }
}

impl Default for OutputEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputPublisher for OutputEventBus {
    async fn publish(&self, event: OutputEvent) -> usize {
        self.send(event)
    }
}
