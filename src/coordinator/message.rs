//! # Commands
//!
//! The messages a [`CoordinatorClient`](super::CoordinatorClient) sends to the
//! [`TrackingCoordinator`](super::TrackingCoordinator). Each carries a one-shot
//! [`Response`] so the caller learns the outcome, even though most commands have
//! no interesting return value beyond "done".

use crate::framework::Response;
use crate::model::{OrderId, OrderTrackingContext, Role};

#[derive(Debug)]
pub enum TrackingCommand {
    /// Start tracking with a caller-supplied snapshot. Replies `false` if the
    /// order was already tracked.
    Start {
        order_id: OrderId,
        role: Role,
        context: OrderTrackingContext,
        respond_to: Response<bool>,
    },
    /// Start tracking, fetching the snapshot from the order snapshot source.
    StartOrder {
        order_id: OrderId,
        role: Role,
        respond_to: Response<bool>,
    },
    /// Replies `false` if the order was not tracked.
    StopOne {
        order_id: OrderId,
        respond_to: Response<bool>,
    },
    /// Replies with the number of sessions stopped.
    StopAll { respond_to: Response<usize> },
    Count { respond_to: Response<usize> },
    IsTracking {
        order_id: OrderId,
        respond_to: Response<bool>,
    },
    /// Stop everything and exit the command loop.
    Shutdown { respond_to: Response<()> },
}
