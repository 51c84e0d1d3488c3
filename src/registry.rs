//! # Session Registry
//!
//! Thread-safe table of live sessions keyed by order id.
//!
//! The map sits behind a `std::sync::Mutex` that is held only for the map
//! operation itself: insert-if-absent on start, remove on stop. Session
//! construction happens while the slot is held (subscribing and spawning are
//! synchronous), so two concurrent starts for one order produce exactly one
//! session. Stopping, which awaits the session task, always happens after the
//! entry has been removed and the lock released.

use crate::config::TrackingConfig;
use crate::framework::TrackingError;
use crate::model::{OrderId, OrderTrackingContext, Role};
use crate::session::{SessionDeps, SessionExitNotice, SessionId, TrackingSession};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct SessionRegistry {
    sessions: Mutex<HashMap<OrderId, TrackingSession>>,
    next_session_id: AtomicU64,
    deps: SessionDeps,
    config: TrackingConfig,
    exits: Option<mpsc::UnboundedSender<SessionExitNotice>>,
}

impl SessionRegistry {
    pub fn new(deps: SessionDeps, config: TrackingConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_session_id: AtomicU64::new(1),
            deps,
            config,
            exits: None,
        }
    }

    /// Sessions that end on their own report to `exits`.
    pub fn with_exit_notices(mut self, exits: mpsc::UnboundedSender<SessionExitNotice>) -> Self {
        self.exits = Some(exits);
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OrderId, TrackingSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts tracking `order_id` unless it is already tracked.
    ///
    /// Returns `Ok(false)` when a live session for the order exists. An entry
    /// whose task has already finished is replaced.
    pub fn start(
        &self,
        order_id: &OrderId,
        role: Role,
        ctx: &OrderTrackingContext,
    ) -> Result<bool, TrackingError> {
        let mut sessions = self.lock();
        match sessions.get(order_id).map(TrackingSession::is_finished) {
            Some(true) => {
                debug!(%order_id, %role, "Replacing finished session");
                sessions.remove(order_id);
            }
            Some(false) => {
                debug!(%order_id, %role, "Already tracked");
                return Ok(false);
            }
            None => {}
        }

        let session_id = SessionId(self.next_session_id.fetch_add(1, Ordering::SeqCst));
        let session = TrackingSession::start(
            session_id,
            order_id.clone(),
            role,
            ctx,
            &self.deps,
            &self.config,
            self.exits.clone(),
        )?;
        sessions.insert(order_id.clone(), session);
        info!(%order_id, %role, %session_id, size = sessions.len(), "Registered");
        Ok(true)
    }

    /// Stops and removes the order's session. Returns `false` if there was none.
    pub async fn stop(&self, order_id: &OrderId) -> bool {
        let session = self.lock().remove(order_id);
        match session {
            Some(session) => {
                session.stop().await;
                info!(%order_id, size = self.count(), "Unregistered");
                true
            }
            None => {
                debug!(%order_id, "Stop for untracked order");
                false
            }
        }
    }

    /// Stops and removes every session. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let drained: Vec<TrackingSession> = self.lock().drain().map(|(_, s)| s).collect();
        let count = drained.len();
        for session in drained {
            session.stop().await;
        }
        if count > 0 {
            info!(count, "All sessions stopped");
        }
        count
    }

    /// Removes a session that ended on its own, provided the entry still
    /// belongs to `session_id`. A newer session for the same order is left alone.
    pub async fn reap(&self, order_id: &OrderId, session_id: SessionId) -> bool {
        let session = {
            let mut sessions = self.lock();
            let current = sessions.get(order_id).map(TrackingSession::session_id);
            if current == Some(session_id) {
                sessions.remove(order_id)
            } else {
                None
            }
        };
        match session {
            Some(session) => {
                session.stop().await;
                info!(%order_id, %session_id, size = self.count(), "Reaped");
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_tracking(&self, order_id: &OrderId) -> bool {
        self.lock().contains_key(order_id)
    }

    pub fn session_id(&self, order_id: &OrderId) -> Option<SessionId> {
        self.lock().get(order_id).map(TrackingSession::session_id)
    }

    /// Tracked orders, sorted.
    pub fn tracked_orders(&self) -> Vec<OrderId> {
        let mut orders: Vec<OrderId> = self.lock().keys().cloned().collect();
        orders.sort();
        orders
    }
}
