use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::trace;

/// Identifies one issued request. Wraps the generation it was issued at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Bookkeeping for a request that has been issued but not yet settled.
#[derive(Debug)]
pub struct PendingRequest {
    pub id: RequestId,
    cancelled: Arc<AtomicBool>,
}

impl PendingRequest {
    pub fn generation(&self) -> u64 {
        self.id.generation()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    pending: HashMap<RequestId, PendingRequest>,
    closed: bool,
    holders: usize,
}

/// Runs fetch operations whose results may stop mattering before they land.
///
/// Cancellation never aborts the operation itself; it only flags the request
/// so that whatever it eventually produces is discarded. `run` checks the
/// flag once, when the operation settles, and reports a discarded result as
/// `Ok(None)`. Callers treat `None` as "do nothing": no cache write, no
/// state change.
///
/// Clones share the same pending set, so a screen can hand a clone to a
/// spawned task and still cancel it from its teardown path.
#[derive(Debug, Clone, Default)]
pub struct RequestCoordinator {
    state: Arc<Mutex<State>>,
    timeout: Option<Duration>,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat any operation that takes longer than `limit` as cancelled.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `operation`, delivering its outcome only if the request is still
    /// live when it settles.
    ///
    /// - `Ok(Some(value))`: the operation succeeded and was not cancelled
    /// - `Err(e)`: the operation failed and was not cancelled
    /// - `Ok(None)`: the request was cancelled, timed out, or the coordinator
    ///   was closed; whatever the operation produced has been dropped
    ///
    /// The request leaves the pending set when this future completes or is
    /// dropped, whichever happens first.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(ticket) = self.issue() else {
            trace!("Coordinator closed, request not issued");
            return Ok(None);
        };

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    trace!(request = %ticket.id, ?limit, "Request timed out, suppressing");
                    ticket.cancelled.store(true, Ordering::Release);
                    return Ok(None);
                }
            },
            None => operation().await,
        };

        if ticket.is_cancelled() {
            trace!(request = %ticket.id, ok = outcome.is_ok(), "Request cancelled, suppressing result");
            return Ok(None);
        }

        trace!(request = %ticket.id, ok = outcome.is_ok(), "Request settled");
        outcome.map(Some)
    }

    /// Cancel everything pending, then run `operation`. Gives "last request
    /// wins" semantics for screens that reload the same data repeatedly.
    pub async fn run_latest<T, E, F, Fut>(&self, operation: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cancel_all();
        self.run(operation).await
    }

    /// Mark every pending request cancelled and forget it.
    ///
    /// Requests that already settled are unaffected. Safe to call repeatedly.
    pub fn cancel_all(&self) {
        let mut state = self.state();
        let cancelled = Self::drain(&mut state);
        if cancelled > 0 {
            trace!(cancelled, "Cancelled pending requests");
        }
    }

    /// Cancel one request. Returns false if it already settled or was cancelled.
    pub fn cancel(&self, id: RequestId) -> bool {
        match self.state().pending.remove(&id) {
            Some(request) => {
                request.cancel();
                trace!(request = %id, "Cancelled request");
                true
            }
            None => false,
        }
    }

    /// Cancel everything and refuse new requests until `open` is called.
    pub fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        let cancelled = Self::drain(&mut state);
        trace!(cancelled, "Coordinator closed");
    }

    pub fn open(&self) {
        self.state().closed = false;
    }

    /// Register one more active holder and open the coordinator.
    pub fn acquire(&self) {
        let mut state = self.state();
        state.holders += 1;
        state.closed = false;
        trace!(holders = state.holders, "Coordinator acquired");
    }

    /// Give up one holder. The last holder out closes the coordinator and
    /// cancels whatever is pending; returns whether that happened.
    pub fn release(&self) -> bool {
        let mut state = self.state();
        state.holders = state.holders.saturating_sub(1);
        if state.holders > 0 {
            trace!(holders = state.holders, "Coordinator released, still held");
            return false;
        }
        state.closed = true;
        let cancelled = Self::drain(&mut state);
        trace!(cancelled, "Last holder released, coordinator closed");
        true
    }

    pub fn holders(&self) -> usize {
        self.state().holders
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    /// Ids of pending requests, oldest first.
    pub fn pending_ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.state().pending.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Total requests issued by this coordinator (the current generation).
    pub fn issued_count(&self) -> u64 {
        self.state().generation
    }

    fn issue(&self) -> Option<Ticket> {
        let mut state = self.state();
        if state.closed {
            return None;
        }
        state.generation += 1;
        let id = RequestId(state.generation);
        let cancelled = Arc::new(AtomicBool::new(false));
        state.pending.insert(
            id,
            PendingRequest {
                id,
                cancelled: Arc::clone(&cancelled),
            },
        );
        trace!(request = %id, pending = state.pending.len(), "Request issued");
        Some(Ticket {
            id,
            cancelled,
            state: Arc::clone(&self.state),
        })
    }

    fn drain(state: &mut State) -> usize {
        let count = state.pending.len();
        for (_, request) in state.pending.drain() {
            request.cancel();
        }
        count
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by an in-flight `run`; removes the request from the pending set on
/// drop so settled or abandoned requests never linger.
struct Ticket {
    id: RequestId,
    cancelled: Arc<AtomicBool>,
    state: Arc<Mutex<State>>,
}

impl Ticket {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending.remove(&self.id);
    }
}
