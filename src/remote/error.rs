//! Error types for the remote location channel.

use crate::model::OrderId;
use thiserror::Error;

/// Failures talking to the remote document store.
///
/// A failed publish is non-fatal for a session; an error delivered on a
/// subscription ends that subscription.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Remote write failed for order {order_id}: {reason}")]
    WriteFailed { order_id: OrderId, reason: String },

    #[error("Remote subscription failed for order {order_id}: {reason}")]
    SubscriptionFailed { order_id: OrderId, reason: String },

    #[error("Remote channel closed")]
    Closed,
}
