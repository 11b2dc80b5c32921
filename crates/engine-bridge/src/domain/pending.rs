//! Pending Request Table - correlates dispatched commands with worker output.
//!
//! Maps request ids to the continuation of the caller that is waiting for
//! them. Every entry owns an explicit timer handle, and every way out of the
//! table (resolution, expiry, cancellation) goes through a single atomic
//! `remove`, so each entry is settled exactly once.

use crate::domain::error::{BridgeError, BridgeResult};
use crate::domain::request_id::RequestId;
use crate::domain::response::WorkerResponse;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What a waiting caller eventually receives.
pub type Settlement = Result<WorkerResponse, BridgeError>;

/// A request waiting for its response.
struct PendingEntry {
    /// Caller-facing command name (for errors and logging)
    command: String,
    /// Channel to settle the caller
    sender: oneshot::Sender<Settlement>,
    /// Expiry timer, aborted on every other settlement path
    timer: AbortHandle,
    /// When the entry was registered
    created_at: Instant,
}

/// Counters for the table.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total entries registered
    pub total_registered: AtomicU64,
    /// Total entries resolved by a worker response
    pub total_resolved: AtomicU64,
    /// Total entries expired by their timer
    pub total_timeouts: AtomicU64,
    /// Total entries cancelled (dispatch failure)
    pub total_cancelled: AtomicU64,
    /// Settlements whose caller had already gone away
    pub total_receiver_dropped: AtomicU64,
}

struct TableInner {
    entries: DashMap<RequestId, PendingEntry>,
    stats: PendingStats,
}

impl TableInner {
    fn settle(&self, id: &RequestId, entry: PendingEntry, settlement: Settlement) {
        if entry.sender.send(settlement).is_err() {
            self.stats
                .total_receiver_dropped
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                request_id = %id,
                command = %entry.command,
                "Caller stopped waiting before settlement"
            );
        }
    }

    fn expire(&self, id: &RequestId, timeout: Duration) {
        let Some((id, entry)) = self.entries.remove(id) else {
            return;
        };

        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        warn!(
            request_id = %id,
            command = %entry.command,
            timeout_ms = timeout.as_millis(),
            "Pending request timed out"
        );

        let error = BridgeError::Timeout {
            command: entry.command.clone(),
            timeout,
        };
        self.settle(&id, entry, Err(error));
    }
}

/// Table of in-flight requests.
///
/// Cheap to clone; clones share the same entries.
///
/// Flow:
/// 1. Invoker generates a `RequestId` and calls `register()`
/// 2. Invoker dispatches the request to the worker
/// 3. Listener sees the echoed id in worker output and calls `resolve()`
/// 4. Otherwise the entry's timer fires and settles it with `Timeout`
#[derive(Clone)]
pub struct PendingRequestTable {
    inner: Arc<TableInner>,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TableInner {
                entries: DashMap::new(),
                stats: PendingStats::default(),
            }),
        }
    }

    /// Register a request and start its expiry timer.
    ///
    /// Returns the receiver the caller awaits. Must be called from within a
    /// Tokio runtime.
    pub fn register(
        &self,
        id: RequestId,
        command: &str,
        timeout: Duration,
    ) -> BridgeResult<oneshot::Receiver<Settlement>> {
        // The shard stays locked until the entry is in place, so a timer that
        // fires immediately still finds it.
        let vacant = match self.inner.entries.entry(id) {
            Entry::Occupied(occupied) => {
                return Err(BridgeError::DuplicateRequest(occupied.key().clone()))
            }
            Entry::Vacant(vacant) => vacant,
        };

        let (tx, rx) = oneshot::channel();
        let created_at = Instant::now();
        let deadline = created_at + timeout;
        let table = Arc::downgrade(&self.inner);
        let timer_id = vacant.key().clone();
        let timer = tokio::spawn(expire_at(table, timer_id, deadline, timeout)).abort_handle();

        debug!(
            request_id = %vacant.key(),
            command = command,
            timeout_ms = timeout.as_millis(),
            "Registered pending request"
        );

        vacant.insert(PendingEntry {
            command: command.to_string(),
            sender: tx,
            timer,
            created_at,
        });
        self.inner
            .stats
            .total_registered
            .fetch_add(1, Ordering::Relaxed);

        Ok(rx)
    }

    /// Settle a request with the worker's response.
    ///
    /// Returns false if no entry is live for `id` (already settled, expired or
    /// never registered); that case is a no-op.
    pub fn resolve(&self, id: &RequestId, response: WorkerResponse) -> bool {
        let Some((id, entry)) = self.inner.entries.remove(id) else {
            return false;
        };
        entry.timer.abort();

        self.inner.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
        debug!(
            request_id = %id,
            command = %entry.command,
            status = %response.status(),
            elapsed_ms = entry.created_at.elapsed().as_millis(),
            "Resolved pending request"
        );

        self.inner.settle(&id, entry, Ok(response));
        true
    }

    /// Settle a request with an error and drop it from the table.
    ///
    /// Returns false if no entry is live for `id`.
    pub fn cancel(&self, id: &RequestId, error: BridgeError) -> bool {
        let Some((id, entry)) = self.inner.entries.remove(id) else {
            return false;
        };
        entry.timer.abort();

        self.inner.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(
            request_id = %id,
            command = %entry.command,
            error = %error,
            "Cancelled pending request"
        );

        self.inner.settle(&id, entry, Err(error));
        true
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.inner.entries.len()
    }

    /// Check if a request id is pending
    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.inner.entries.contains_key(id)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.inner.stats
    }
}

impl Default for PendingRequestTable {
    fn default() -> Self {
        Self::new()
    }
}

async fn expire_at(table: Weak<TableInner>, id: RequestId, deadline: Instant, timeout: Duration) {
    tokio::time::sleep_until(deadline).await;
    if let Some(table) = table.upgrade() {
        table.expire(&id, timeout);
    }
}
