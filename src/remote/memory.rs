//! In-memory stand-in for the remote document store.
//!
//! One document per order, a listener list per order, and a few switches to
//! inject the failures a real network produces: rejected writes, writes that
//! hang until released, and subscriptions that break mid-stream.

use super::{RecordStream, RemoteLocationChannel, TransportError};
use crate::framework::subscription::{self, Emitter};
use crate::model::{GeoPoint, LiveLocationRecord, OrderId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

const DEFAULT_BUFFER: usize = 64;

type RecordEmitter = Emitter<Result<LiveLocationRecord, TransportError>>;

#[derive(Default)]
struct StoreState {
    documents: HashMap<OrderId, LiveLocationRecord>,
    listeners: HashMap<OrderId, Vec<RecordEmitter>>,
    /// Applied writes, in order.
    writes: Vec<(OrderId, LiveLocationRecord)>,
    attempts: usize,
    fail_publishes: bool,
}

/// A [`RemoteLocationChannel`] backed by a process-local map.
#[derive(Clone)]
pub struct InMemoryLocationStore {
    state: Arc<Mutex<StoreState>>,
    written: Arc<Notify>,
    paused: Arc<watch::Sender<bool>>,
    buffer: usize,
}

impl Default for InMemoryLocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            written: Arc::new(Notify::new()),
            paused: Arc::new(paused),
            buffer: DEFAULT_BUFFER,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent publish fail with [`TransportError::WriteFailed`].
    pub fn fail_publishes(&self, fail: bool) {
        self.lock().fail_publishes = fail;
    }

    /// Holds publishes in flight until [`resume_publishes`](Self::resume_publishes).
    pub fn pause_publishes(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume_publishes(&self) {
        self.paused.send_replace(false);
    }

    /// Ends every listener on `order_id` with a transport error.
    ///
    /// The error waits for buffer space, so a listener that is behind still
    /// receives it after its pending records.
    pub async fn break_subscriptions(&self, order_id: &OrderId, reason: &str) -> usize {
        let listeners = self.lock().listeners.remove(order_id).unwrap_or_default();
        let count = listeners.len();
        for emitter in listeners {
            let error = TransportError::SubscriptionFailed {
                order_id: order_id.clone(),
                reason: reason.to_string(),
            };
            emitter.emit(Err(error)).await;
        }
        warn!(%order_id, count, reason, "Subscriptions broken");
        count
    }

    pub fn document(&self, order_id: &OrderId) -> Option<LiveLocationRecord> {
        self.lock().documents.get(order_id).copied()
    }

    /// Applied writes for one order, oldest first.
    pub fn writes_for(&self, order_id: &OrderId) -> Vec<LiveLocationRecord> {
        self.lock()
            .writes
            .iter()
            .filter(|(id, _)| id == order_id)
            .map(|(_, record)| *record)
            .collect()
    }

    /// Publish calls received, including failed and still-pending ones.
    pub fn publish_attempts(&self) -> usize {
        self.lock().attempts
    }

    pub fn listener_count(&self, order_id: &OrderId) -> usize {
        let mut state = self.lock();
        match state.listeners.get_mut(order_id) {
            Some(listeners) => {
                listeners.retain(|e| !e.is_closed());
                listeners.len()
            }
            None => 0,
        }
    }

    /// Waits until `count` writes for `order_id` have been applied, or `timeout`
    /// elapses. Returns the writes seen.
    pub async fn wait_for_writes(
        &self,
        order_id: &OrderId,
        count: usize,
        timeout: Duration,
    ) -> Vec<LiveLocationRecord> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.written.notified();
            let writes = self.writes_for(order_id);
            if writes.len() >= count {
                return writes;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.writes_for(order_id);
            }
        }
    }
}

#[async_trait]
impl RemoteLocationChannel for InMemoryLocationStore {
    async fn publish(
        &self,
        order_id: &OrderId,
        location: GeoPoint,
        arrived: bool,
    ) -> Result<(), TransportError> {
        self.lock().attempts += 1;

        let mut paused = self.paused.subscribe();
        let resumed = paused.wait_for(|p| !*p).await.is_ok();
        if !resumed {
            return Err(TransportError::Closed);
        }

        let record = LiveLocationRecord::new(location, arrived);
        let targets: Vec<RecordEmitter> = {
            let mut state = self.lock();
            if state.fail_publishes {
                return Err(TransportError::WriteFailed {
                    order_id: order_id.clone(),
                    reason: "write rejected".to_string(),
                });
            }
            state.documents.insert(order_id.clone(), record);
            state.writes.push((order_id.clone(), record));
            match state.listeners.get_mut(order_id) {
                Some(listeners) => {
                    listeners.retain(|e| !e.is_closed());
                    listeners.clone()
                }
                None => Vec::new(),
            }
        };
        self.written.notify_waiters();

        debug!(%order_id, %location, arrived, listeners = targets.len(), "Record written");
        for emitter in targets {
            emitter.emit(Ok(record)).await;
        }
        Ok(())
    }

    fn subscribe(&self, order_id: &OrderId) -> Result<RecordStream, TransportError> {
        let (emitter, stream) = subscription::channel(self.buffer);
        let mut state = self.lock();
        if let Some(current) = state.documents.get(order_id) {
            emitter.try_emit(Ok(*current));
        }
        state
            .listeners
            .entry(order_id.clone())
            .or_default()
            .push(emitter);
        debug!(%order_id, "Listener attached");
        Ok(stream)
    }
}
