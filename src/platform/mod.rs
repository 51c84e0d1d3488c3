//! Collaborators the tracking engine consumes but does not own.
//!
//! The host application implements these against the real OS: a notification
//! manager, a foreground-service wrapper, the permission APIs, and the order
//! repository. In-process implementations for tests live in
//! [`framework::mock`](crate::framework::mock).

use crate::model::{OrderId, OrderTrackingContext, Role, TrackingNotification};
use async_trait::async_trait;

/// Renders, updates and removes the per-order status indicator.
pub trait NotificationPresenter: Send + Sync {
    /// Create or update the order's notification.
    fn refresh(&self, notification: TrackingNotification);

    /// Remove the order's notification. Must tolerate unknown orders.
    fn dismiss(&self, order_id: &OrderId);
}

/// Keeps the background process alive with a generic "tracking active" indicator.
///
/// Only the coordinator calls this, and only on the registry's empty/non-empty
/// transitions.
pub trait ForegroundHost: Send + Sync {
    fn bring_to_foreground(&self);
    fn release_foreground(&self);
}

/// Granted location accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPermission {
    /// Precise location; high-accuracy requests are honored.
    Fine,
    /// Approximate location only; requests are degraded.
    Coarse,
    Denied,
}

impl LocationPermission {
    pub fn is_granted(self) -> bool {
        !matches!(self, LocationPermission::Denied)
    }
}

/// Read-only view of the runtime permissions the engine depends on.
pub trait PermissionGate: Send + Sync {
    fn location_permission(&self) -> LocationPermission;
    fn notifications_granted(&self) -> bool;
}

/// Supplies the immutable snapshot needed to start tracking an order.
#[async_trait]
pub trait OrderSnapshotSource: Send + Sync {
    async fn tracking_context(&self, order_id: &OrderId, role: Role)
        -> Option<OrderTrackingContext>;
}
