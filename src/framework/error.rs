//! # Tracking Errors
//!
//! Only start-time failures reach the caller. Everything that goes wrong while
//! a session is running (a failed publish, a dropped subscription) is absorbed
//! and logged inside the session, so it never shows up here.

use crate::location::LocationError;
use crate::model::OrderId;
use crate::remote::TransportError;
use std::fmt::Display;
use thiserror::Error;

/// Permission a start request can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Location,
    Notifications,
}

impl Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionKind::Location => f.write_str("location"),
            PermissionKind::Notifications => f.write_str("notifications"),
        }
    }
}

/// Errors surfaced by the coordinator and registry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    /// A required permission is missing; no session was created.
    #[error("Permission denied: {0}")]
    PermissionDenied(PermissionKind),

    /// The start request's context is incomplete or inconsistent.
    #[error("Invalid tracking context for order {order_id}: {reason}")]
    InvalidContext { order_id: OrderId, reason: String },

    /// The location provider refused the subscription.
    #[error("Location error: {0}")]
    Location(LocationError),

    /// The remote channel refused the subscription.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No snapshot could be resolved for a start-by-id request.
    #[error("No tracking snapshot for order {0}")]
    SnapshotUnavailable(OrderId),

    #[error("Coordinator closed")]
    CoordinatorClosed,

    #[error("Coordinator dropped response channel")]
    CoordinatorDropped,

    #[error("Coordinator task failed: {0}")]
    TaskFailed(String),
}

impl From<LocationError> for TrackingError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => {
                TrackingError::PermissionDenied(PermissionKind::Location)
            }
            other => TrackingError::Location(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_permission_maps_to_permission_denied() {
        let err: TrackingError = LocationError::PermissionDenied.into();
        assert_eq!(err, TrackingError::PermissionDenied(PermissionKind::Location));

        let err: TrackingError = LocationError::Unavailable("gps off".into()).into();
        assert!(matches!(err, TrackingError::Location(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = TrackingError::InvalidContext {
            order_id: OrderId::new("O1"),
            reason: "destination out of range".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid tracking context for order O1: destination out of range"
        );
        assert_eq!(
            TrackingError::PermissionDenied(PermissionKind::Notifications).to_string(),
            "Permission denied: notifications"
        );
    }
}
