//! # Coordinator Client
//!
//! Cheap, cloneable handle to the coordinator's command loop. Every method sends
//! one [`TrackingCommand`] and waits for its reply.

use super::TrackingCommand;
use crate::framework::TrackingError;
use crate::model::{OrderId, OrderTrackingContext, Role};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct CoordinatorClient {
    sender: mpsc::Sender<TrackingCommand>,
}

impl CoordinatorClient {
    pub fn new(sender: mpsc::Sender<TrackingCommand>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, TrackingError>>) -> TrackingCommand,
    ) -> Result<T, TrackingError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| TrackingError::CoordinatorClosed)?;
        response.await.map_err(|_| TrackingError::CoordinatorDropped)?
    }

    /// Starts tracking `order_id`. `Ok(false)` means it was already tracked.
    ///
    /// # Errors
    /// [`TrackingError::PermissionDenied`] or [`TrackingError::InvalidContext`]
    /// when a precondition fails; no session is created in that case.
    #[instrument(skip(self, context))]
    pub async fn start(
        &self,
        order_id: OrderId,
        role: Role,
        context: OrderTrackingContext,
    ) -> Result<bool, TrackingError> {
        debug!("Sending request");
        self.request(|respond_to| TrackingCommand::Start {
            order_id,
            role,
            context,
            respond_to,
        })
        .await
    }

    /// Starts tracking with the snapshot the coordinator's snapshot source has
    /// for `order_id`.
    #[instrument(skip(self))]
    pub async fn start_order(&self, order_id: OrderId, role: Role) -> Result<bool, TrackingError> {
        debug!("Sending request");
        self.request(|respond_to| TrackingCommand::StartOrder {
            order_id,
            role,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn stop_one(&self, order_id: OrderId) -> Result<bool, TrackingError> {
        debug!("Sending request");
        self.request(|respond_to| TrackingCommand::StopOne {
            order_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn stop_all(&self) -> Result<usize, TrackingError> {
        debug!("Sending request");
        self.request(|respond_to| TrackingCommand::StopAll { respond_to })
            .await
    }

    pub async fn count(&self) -> Result<usize, TrackingError> {
        self.request(|respond_to| TrackingCommand::Count { respond_to })
            .await
    }

    pub async fn is_tracking(&self, order_id: OrderId) -> Result<bool, TrackingError> {
        self.request(|respond_to| TrackingCommand::IsTracking {
            order_id,
            respond_to,
        })
        .await
    }

    /// Asks the coordinator to stop every session and exit.
    pub async fn shutdown(&self) -> Result<(), TrackingError> {
        self.request(|respond_to| TrackingCommand::Shutdown { respond_to })
            .await
    }
}
