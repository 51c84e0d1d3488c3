//! # Remote Location Channel
//!
//! Per-order pub/sub over a [`LiveLocationRecord`] document.
//!
//! The partner side writes the record with [`RemoteLocationChannel::publish`];
//! the customer side watches it with [`RemoteLocationChannel::subscribe`].
//! Writes are last-write-wins with no versioning. A subscription starts from the
//! current snapshot (if any) and then delivers every later write. When the
//! transport fails, the stream yields one final `Err` and ends.
//!
//! ## Structure
//!
//! - [`error`] - [`TransportError`]
//! - [`memory`] - [`InMemoryLocationStore`], a document store stand-in with
//!   fault injection

pub mod error;
pub mod memory;

pub use error::*;
pub use memory::*;

use crate::framework::Subscription;
use crate::model::{GeoPoint, LiveLocationRecord, OrderId};
use async_trait::async_trait;

/// Stream of remote snapshots for one order.
pub type RecordStream = Subscription<Result<LiveLocationRecord, TransportError>>;

#[async_trait]
pub trait RemoteLocationChannel: Send + Sync {
    /// Upserts the order's live location record.
    async fn publish(
        &self,
        order_id: &OrderId,
        location: GeoPoint,
        arrived: bool,
    ) -> Result<(), TransportError>;

    /// Attaches a listener to the order's record.
    ///
    /// Cancelling the returned stream detaches the listener; cancelling twice is
    /// harmless.
    fn subscribe(&self, order_id: &OrderId) -> Result<RecordStream, TransportError>;
}
