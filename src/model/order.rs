/// Order-level data captured when tracking starts.
///
/// # Tracking
/// An [`OrderTrackingContext`] is the immutable snapshot a
/// [`TrackingSession`](crate::session::TrackingSession) is built from. It is never
/// live-updated; a fresh snapshot requires a fresh start.
use crate::model::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Opaque identifier for an order, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the order this device is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Service provider; publishes its own position.
    Partner,
    /// Requester; observes the partner's published position.
    Customer,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Partner => f.write_str("PARTNER"),
            Role::Customer => f.write_str("CUSTOMER"),
        }
    }
}

/// Snapshot needed to start tracking an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTrackingContext {
    pub order_id: OrderId,
    pub destination: GeoPoint,
    /// Where the partner was when the order was accepted, if known.
    pub partner_start_location: Option<GeoPoint>,
    pub role: Role,
}

impl OrderTrackingContext {
    pub fn new(order_id: impl Into<OrderId>, role: Role, destination: GeoPoint) -> Self {
        Self {
            order_id: order_id.into(),
            destination,
            partner_start_location: None,
            role,
        }
    }

    pub fn with_partner_start(mut self, start: GeoPoint) -> Self {
        self.partner_start_location = Some(start);
        self
    }
}

/// The per-order document the partner writes and the customer observes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveLocationRecord {
    pub location: GeoPoint,
    pub arrived: bool,
}

impl LiveLocationRecord {
    pub fn new(location: GeoPoint, arrived: bool) -> Self {
        Self { location, arrived }
    }
}
