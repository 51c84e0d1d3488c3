use crate::model::{distance_meters, GeoPoint, OrderId, OrderTrackingContext, ProgressEstimate};
use tracing::{debug, warn};

/// How much farther than the snapshot's start the first fix may be before the
/// snapshot is reported as probably stale.
const STALE_START_SLACK_METERS: f64 = 100.0;

/// Turns successive partner positions into progress toward the destination.
///
/// The initial distance is fixed on the first observation: from the snapshot's
/// partner start location when there is one, otherwise from the first position
/// seen. It is never recomputed afterwards.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    order_id: OrderId,
    destination: GeoPoint,
    partner_start: Option<GeoPoint>,
    initial_distance: Option<f64>,
}

impl ProgressTracker {
    pub fn new(ctx: &OrderTrackingContext) -> Self {
        Self {
            order_id: ctx.order_id.clone(),
            destination: ctx.destination,
            partner_start: ctx.partner_start_location,
            initial_distance: None,
        }
    }

    pub fn initial_distance(&self) -> Option<f64> {
        self.initial_distance
    }

    pub fn observe(&mut self, position: GeoPoint) -> ProgressEstimate {
        let current = distance_meters(position, self.destination);
        let initial = match self.initial_distance {
            Some(initial) => initial,
            None => {
                let initial = self.first_initial_distance(current);
                self.initial_distance = Some(initial);
                initial
            }
        };
        ProgressEstimate::compute(initial, current)
    }

    fn first_initial_distance(&self, current: f64) -> f64 {
        match self.partner_start {
            Some(start) => {
                let initial = distance_meters(start, self.destination);
                // The snapshot can predate the partner's real departure point.
                if current > initial + STALE_START_SLACK_METERS {
                    warn!(
                        order_id = %self.order_id,
                        initial_distance = initial,
                        current_distance = current,
                        "Partner start location looks stale; progress will read 0 until the partner closes the gap"
                    );
                }
                debug!(order_id = %self.order_id, initial_distance = initial, "Initial distance from snapshot");
                initial
            }
            None => {
                debug!(order_id = %self.order_id, initial_distance = current, "Initial distance from first fix");
                current
            }
        }
    }
}
