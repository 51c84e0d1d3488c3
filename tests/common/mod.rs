#![allow(dead_code)]

use order_tracker::config::TrackingConfig;
use order_tracker::coordinator::TrackingDeps;
use order_tracker::framework::mock::{
    InMemoryOrderSnapshots, RecordingForeground, RecordingPresenter, StaticPermissions,
};
use order_tracker::lifecycle::TrackingSystem;
use order_tracker::location::SimulatedLocationSource;
use order_tracker::model::{GeoPoint, OrderTrackingContext, Role};
use order_tracker::platform::PermissionGate;
use order_tracker::remote::InMemoryLocationStore;
use std::sync::Arc;
use std::time::Duration;

pub const DEST: GeoPoint = GeoPoint::new(-6.200, 106.816);
pub const START: GeoPoint = GeoPoint::new(-6.210, 106.820);
pub const MIDWAY: GeoPoint = GeoPoint::new(-6.205, 106.818);

pub const WAIT: Duration = Duration::from_secs(2);

/// A running system plus handles on every double it was wired with.
pub struct Harness {
    pub system: TrackingSystem,
    pub location: Arc<SimulatedLocationSource>,
    pub store: Arc<InMemoryLocationStore>,
    pub presenter: Arc<RecordingPresenter>,
    pub foreground: Arc<RecordingForeground>,
    pub permissions: Arc<StaticPermissions>,
    pub snapshots: Arc<InMemoryOrderSnapshots>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_permissions(StaticPermissions::granted())
    }

    pub fn with_permissions(permissions: StaticPermissions) -> Self {
        let location = Arc::new(SimulatedLocationSource::new(permissions.location_permission()));
        let store = Arc::new(InMemoryLocationStore::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let foreground = Arc::new(RecordingForeground::new());
        let permissions = Arc::new(permissions);
        let snapshots = Arc::new(InMemoryOrderSnapshots::new());

        let deps = TrackingDeps {
            location: location.clone(),
            remote: store.clone(),
            presenter: presenter.clone(),
            foreground: foreground.clone(),
            permissions: permissions.clone(),
            snapshots: snapshots.clone(),
        };
        let config = TrackingConfig::default()
            .with_location_interval(Duration::ZERO)
            .with_min_displacement(0.0);

        Self {
            system: TrackingSystem::new(deps, config),
            location,
            store,
            presenter,
            foreground,
            permissions,
            snapshots,
        }
    }
}

pub fn partner_ctx(id: &str) -> OrderTrackingContext {
    OrderTrackingContext::new(id, Role::Partner, DEST).with_partner_start(START)
}

pub fn customer_ctx(id: &str) -> OrderTrackingContext {
    OrderTrackingContext::new(id, Role::Customer, DEST).with_partner_start(START)
}

/// Polls `count` until it reaches `expected` or [`WAIT`] elapses.
pub async fn wait_for_count(harness: &Harness, expected: usize) -> usize {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let count = harness
            .system
            .client
            .count()
            .await
            .expect("Failed to count sessions");
        if count == expected || tokio::time::Instant::now() >= deadline {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
