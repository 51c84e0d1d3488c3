//! Customer side: watch the partner's published position.

use super::{ProgressTracker, SessionExit};
use crate::model::{LiveLocationRecord, OrderId, Role, TrackingNotification, TrackingStatus};
use crate::platform::NotificationPresenter;
use crate::remote::RecordStream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct CustomerObserver {
    pub(crate) order_id: OrderId,
    pub(crate) records: RecordStream,
    pub(crate) tracker: ProgressTracker,
    pub(crate) presenter: Arc<dyn NotificationPresenter>,
}

impl CustomerObserver {
    pub(crate) async fn run(mut self, cancel: CancellationToken) -> SessionExit {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionExit::Cancelled,
                next = self.records.recv() => next,
            };
            if cancel.is_cancelled() {
                return SessionExit::Cancelled;
            }
            match next {
                Some(Ok(record)) => self.on_record(record),
                // Session-fatal; only a fresh start recovers.
                Some(Err(e)) => {
                    warn!(error = %e, "Remote subscription terminated");
                    return SessionExit::SubscriptionTerminated(e);
                }
                None => return SessionExit::StreamEnded,
            }
        }
    }

    fn on_record(&mut self, record: LiveLocationRecord) {
        let progress = self.tracker.observe(record.location);
        debug!(
            location = %record.location,
            arrived = record.arrived,
            percent = progress.percent,
            distance = progress.current_distance_meters,
            "Partner record"
        );

        let status = if record.arrived {
            TrackingStatus::Arrived
        } else {
            TrackingStatus::OnTheWay
        };
        self.presenter.refresh(TrackingNotification::from_progress(
            self.order_id.clone(),
            Role::Customer,
            status,
            progress,
        ));
    }
}
