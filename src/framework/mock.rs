//! # Test Doubles
//!
//! In-memory implementations of the platform collaborators, so sessions, the
//! registry and the coordinator can be exercised without a device.
//!
//! | Double | Stands in for | Useful for |
//! |--------|---------------|------------|
//! | [`RecordingPresenter`] | [`NotificationPresenter`] | asserting refreshes and dismissals per order |
//! | [`RecordingForeground`] | [`ForegroundHost`] | asserting the foreground indicator follows the session count |
//! | [`StaticPermissions`] | [`PermissionGate`] | toggling permissions between starts |
//! | [`InMemoryOrderSnapshots`] | [`OrderSnapshotSource`] | start-by-id |
//!
//! The location provider and document store doubles are real implementations
//! in their own modules: [`SimulatedLocationSource`](crate::location::SimulatedLocationSource)
//! and [`InMemoryLocationStore`](crate::remote::InMemoryLocationStore).
//!
//! ## Waiting for Async Effects
//!
//! Sessions run in their own tasks, so a test that pushes a location has to
//! wait for the refresh to show up. [`RecordingPresenter::wait_for_refreshes`]
//! does that without sleeping:
//!
//! ```rust
//! use order_tracker::framework::mock::RecordingPresenter;
//! use order_tracker::model::{OrderId, Role, TrackingNotification, TrackingStatus};
//! use order_tracker::platform::NotificationPresenter;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let presenter = RecordingPresenter::new();
//!     let order = OrderId::new("O1");
//!     presenter.refresh(TrackingNotification {
//!         order_id: order.clone(),
//!         role: Role::Customer,
//!         status: TrackingStatus::OnTheWay,
//!         percent: 40,
//!         short_text: "600 m".into(),
//!     });
//!     let seen = presenter.wait_for_refreshes(&order, 1, Duration::from_secs(1)).await;
//!     assert_eq!(seen[0].percent, 40);
//! }
//! ```

use crate::model::{OrderId, OrderTrackingContext, Role, TrackingNotification};
use crate::platform::{
    ForegroundHost, LocationPermission, NotificationPresenter, OrderSnapshotSource,
    PermissionGate,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One call observed by [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    Refresh(TrackingNotification),
    Dismiss(OrderId),
}

/// Records every refresh and dismissal, in call order.
#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
    changed: Notify,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        lock(&self.events).clone()
    }

    pub fn refreshes_for(&self, order_id: &OrderId) -> Vec<TrackingNotification> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Refresh(n) if &n.order_id == order_id => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn dismissals(&self, order_id: &OrderId) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| matches!(e, PresenterEvent::Dismiss(id) if id == order_id))
            .count()
    }

    /// Waits until at least `count` refreshes exist for `order_id` or `timeout`
    /// elapses, then returns what was recorded.
    pub async fn wait_for_refreshes(
        &self,
        order_id: &OrderId,
        count: usize,
        timeout: Duration,
    ) -> Vec<TrackingNotification> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.changed.notified();
            let refreshes = self.refreshes_for(order_id);
            if refreshes.len() >= count {
                return refreshes;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.refreshes_for(order_id);
            }
        }
    }

    /// Waits until `order_id` has been dismissed at least once.
    pub async fn wait_for_dismissal(&self, order_id: &OrderId, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.changed.notified();
            if self.dismissals(order_id) > 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.dismissals(order_id) > 0;
            }
        }
    }

    fn record(&self, event: PresenterEvent) {
        lock(&self.events).push(event);
        self.changed.notify_waiters();
    }
}

impl NotificationPresenter for RecordingPresenter {
    fn refresh(&self, notification: TrackingNotification) {
        self.record(PresenterEvent::Refresh(notification));
    }

    fn dismiss(&self, order_id: &OrderId) {
        self.record(PresenterEvent::Dismiss(order_id.clone()));
    }
}

/// Tracks the foreground indicator and counts transitions.
#[derive(Default)]
pub struct RecordingForeground {
    on: AtomicBool,
    raised: AtomicUsize,
    released: AtomicUsize,
}

impl RecordingForeground {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn times_raised(&self) -> usize {
        self.raised.load(Ordering::SeqCst)
    }

    pub fn times_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ForegroundHost for RecordingForeground {
    fn bring_to_foreground(&self) {
        self.on.store(true, Ordering::SeqCst);
        self.raised.fetch_add(1, Ordering::SeqCst);
    }

    fn release_foreground(&self) {
        self.on.store(false, Ordering::SeqCst);
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Permissions that only change when a test says so.
pub struct StaticPermissions {
    location: Mutex<LocationPermission>,
    notifications: AtomicBool,
}

impl StaticPermissions {
    pub fn new(location: LocationPermission, notifications: bool) -> Self {
        Self {
            location: Mutex::new(location),
            notifications: AtomicBool::new(notifications),
        }
    }

    /// Fine location and notifications.
    pub fn granted() -> Self {
        Self::new(LocationPermission::Fine, true)
    }

    pub fn set_location(&self, permission: LocationPermission) {
        *lock(&self.location) = permission;
    }

    pub fn set_notifications(&self, granted: bool) {
        self.notifications.store(granted, Ordering::SeqCst);
    }
}

impl PermissionGate for StaticPermissions {
    fn location_permission(&self) -> LocationPermission {
        *lock(&self.location)
    }

    fn notifications_granted(&self) -> bool {
        self.notifications.load(Ordering::SeqCst)
    }
}

/// Snapshot source backed by a map. Contexts are returned as stored, so a role
/// mismatch reaches the coordinator's validation.
#[derive(Default)]
pub struct InMemoryOrderSnapshots {
    contexts: Mutex<HashMap<OrderId, OrderTrackingContext>>,
}

impl InMemoryOrderSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ctx: OrderTrackingContext) {
        lock(&self.contexts).insert(ctx.order_id.clone(), ctx);
    }
}

#[async_trait]
impl OrderSnapshotSource for InMemoryOrderSnapshots {
    async fn tracking_context(
        &self,
        order_id: &OrderId,
        _role: Role,
    ) -> Option<OrderTrackingContext> {
        lock(&self.contexts).get(order_id).cloned()
    }
}
