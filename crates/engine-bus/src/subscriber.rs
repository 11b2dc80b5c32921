//! # Event Subscriber
//!
//! Defines the receiving side of the output bus.

use crate::events::OutputEvent;
use crate::publisher::SubscriberMap;
use std::sync::Weak;
use tokio::sync::mpsc;
use tracing::debug;

/// A subscription handle for one event name.
///
/// When dropped, the subscription is removed from the bus.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<OutputEvent>,
    name: String,
    id: u64,
    subscriptions: Weak<SubscriberMap>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<OutputEvent>,
        name: String,
        id: u64,
        subscriptions: Weak<SubscriberMap>,
    ) -> Self {
        Self {
            receiver,
            name,
            id,
            subscriptions,
        }
    }

    /// Receive the next event carrying this subscription's name.
    ///
    /// Returns `None` once the bus is gone and every queued event has been
    /// received.
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.receiver.recv().await
    }

    /// Event name this subscription filters on.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(subscriptions) = self.subscriptions.upgrade() else {
            return;
        };
        let Ok(mut subs) = subscriptions.write() else {
            return;
        };
        let Some(slots) = subs.get_mut(&self.name) else {
            return;
        };

        slots.retain(|slot| slot.id != self.id);
        if slots.is_empty() {
            subs.remove(&self.name);
        }
        debug!(event = %self.name, id = self.id, "Output subscription dropped");
    }
}
