use crate::model::{OrderId, ProgressEstimate, Role};
use std::fmt::Display;

/// Status label shown on an order's tracking notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    OnTheWay,
    Arrived,
}

impl Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingStatus::OnTheWay => f.write_str("ON_THE_WAY"),
            TrackingStatus::Arrived => f.write_str("ARRIVED"),
        }
    }
}

/// Everything a [`NotificationPresenter`](crate::platform::NotificationPresenter)
/// needs to render one refresh. Wording and layout are the presenter's business.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingNotification {
    pub order_id: OrderId,
    pub role: Role,
    pub status: TrackingStatus,
    pub percent: u8,
    /// Remaining distance, e.g. `"1.2 km"`.
    pub short_text: String,
}

impl TrackingNotification {
    pub fn from_progress(
        order_id: OrderId,
        role: Role,
        status: TrackingStatus,
        progress: ProgressEstimate,
    ) -> Self {
        Self {
            order_id,
            role,
            status,
            percent: progress.percent,
            short_text: crate::model::format_distance(progress.current_distance_meters),
        }
    }
}
