//! Response listener.
//!
//! Subscribes once to the worker output event and settles pending requests
//! from whatever it reads. Nothing it encounters is an error for anybody
//! else: malformed lines, uncorrelated responses and responses for requests
//! that already settled are counted, traced and dropped.

use crate::domain::pending::PendingRequestTable;
use crate::ipc::line_parser::parse_output;
use engine_bus::{OutputEventBus, Subscription};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counters for the listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Output events handled
    pub events: AtomicU64,
    /// Well-formed responses seen
    pub responses: AtomicU64,
    /// Non-protocol lines skipped
    pub skipped_lines: AtomicU64,
    /// Malformed protocol lines ignored
    pub ignored_lines: AtomicU64,
    /// Responses without a request id
    pub uncorrelated: AtomicU64,
    /// Responses whose id had no live entry
    pub unmatched: AtomicU64,
    /// Pending entries resolved
    pub resolved: AtomicU64,
}

/// Turns output payloads into resolutions.
#[derive(Clone)]
struct ResponseRouter {
    pending: PendingRequestTable,
    stats: Arc<ListenerStats>,
}

impl ResponseRouter {
    fn handle_payload(&self, payload: &str) -> usize {
        let parsed = parse_output(payload);
        let stats = &self.stats;

        stats.events.fetch_add(1, Ordering::Relaxed);
        stats
            .skipped_lines
            .fetch_add(parsed.skipped as u64, Ordering::Relaxed);
        stats
            .ignored_lines
            .fetch_add(parsed.ignored.len() as u64, Ordering::Relaxed);

        let mut resolved = 0;
        for response in parsed.responses {
            stats.responses.fetch_add(1, Ordering::Relaxed);

            let Some(request_id) = response.request_id().cloned() else {
                stats.uncorrelated.fetch_add(1, Ordering::Relaxed);
                debug!(status = %response.status(), "Dropping response without request id");
                continue;
            };

            if self.pending.resolve(&request_id, response) {
                stats.resolved.fetch_add(1, Ordering::Relaxed);
                resolved += 1;
            } else {
                stats.unmatched.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    "Response for unknown or already settled request"
                );
            }
        }

        resolved
    }

    async fn run(self, mut subscription: Subscription) {
        info!(event = subscription.name(), "Listening for worker output");

        while let Some(event) = subscription.recv().await {
            self.handle_payload(&event.payload);
        }

        warn!(
            event = subscription.name(),
            "Output bus closed, stopping listener"
        );
    }
}

/// Single subscription to the worker output event.
///
/// Installation is lazy and idempotent: the first call to
/// [`ensure_installed`](Self::ensure_installed) subscribes and spawns the
/// drain task, later calls do nothing. The subscription exists before the
/// first call returns, so output produced after that point is never missed.
pub struct ResponseListener {
    bus: Arc<OutputEventBus>,
    event_name: String,
    router: ResponseRouter,
    task: OnceLock<JoinHandle<()>>,
}

impl ResponseListener {
    pub fn new(
        pending: PendingRequestTable,
        bus: Arc<OutputEventBus>,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            event_name: event_name.into(),
            router: ResponseRouter {
                pending,
                stats: Arc::new(ListenerStats::default()),
            },
            task: OnceLock::new(),
        }
    }

    /// Install the subscription if it is not installed yet.
    ///
    /// Returns true if this call performed the installation. Must be called
    /// from within a Tokio runtime.
    pub fn ensure_installed(&self) -> bool {
        let mut installed_now = false;
        self.task.get_or_init(|| {
            installed_now = true;
            let subscription = self.bus.subscribe(&self.event_name);
            tokio::spawn(self.router.clone().run(subscription))
        });
        installed_now
    }

    pub fn is_installed(&self) -> bool {
        self.task.get().is_some()
    }

    /// Process one output payload synchronously.
    ///
    /// Returns the number of pending entries it resolved.
    pub fn handle_payload(&self, payload: &str) -> usize {
        self.router.handle_payload(payload)
    }

    pub fn stats(&self) -> &ListenerStats {
        &self.router.stats
    }
}

impl Drop for ResponseListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.get() {
            task.abort();
        }
    }
}
