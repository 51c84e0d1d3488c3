//! Partner side: publish our own position and show progress locally.

use super::{ProgressTracker, SessionExit};
use crate::framework::Subscription;
use crate::model::{GeoPoint, OrderId, Role, TrackingNotification, TrackingStatus};
use crate::platform::NotificationPresenter;
use crate::remote::RemoteLocationChannel;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

pub(crate) struct PartnerPublisher {
    pub(crate) order_id: OrderId,
    pub(crate) points: Subscription<GeoPoint>,
    pub(crate) tracker: ProgressTracker,
    pub(crate) remote: Arc<dyn RemoteLocationChannel>,
    pub(crate) presenter: Arc<dyn NotificationPresenter>,
    pub(crate) arrival_radius_meters: f64,
}

impl PartnerPublisher {
    pub(crate) async fn run(mut self, cancel: CancellationToken) -> SessionExit {
        loop {
            let point = tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionExit::Cancelled,
                next = self.points.recv() => match next {
                    Some(point) => point,
                    None if cancel.is_cancelled() => return SessionExit::Cancelled,
                    None => return SessionExit::StreamEnded,
                },
            };
            if cancel.is_cancelled() {
                return SessionExit::Cancelled;
            }
            self.on_point(point);
        }
    }

    fn on_point(&mut self, point: GeoPoint) {
        let progress = self.tracker.observe(point);
        let arrived = progress.current_distance_meters <= self.arrival_radius_meters;
        debug!(
            %point,
            percent = progress.percent,
            distance = progress.current_distance_meters,
            arrived,
            "Partner fix"
        );

        self.spawn_publish(point, arrived);

        let status = if arrived {
            TrackingStatus::Arrived
        } else {
            TrackingStatus::OnTheWay
        };
        self.presenter.refresh(TrackingNotification::from_progress(
            self.order_id.clone(),
            Role::Partner,
            status,
            progress,
        ));
    }

    /// Fire-and-forget; a failed write is only logged.
    fn spawn_publish(&self, point: GeoPoint, arrived: bool) {
        let remote = Arc::clone(&self.remote);
        let order_id = self.order_id.clone();
        tokio::spawn(
            async move {
                match remote.publish(&order_id, point, arrived).await {
                    Ok(()) => debug!("Location published"),
                    Err(e) => warn!(error = %e, "Location publish failed"),
                }
            }
            .in_current_span(),
        );
    }
}
