//! # Order Tracker Demo
//!
//! Tracks one delivery from both ends in a single process. A partner session
//! publishes simulated positions to the in-memory store; the demo mirrors each
//! write onto a second order id that a customer session follows, since one
//! process holds at most one session per order.

use order_tracker::config::TrackingConfig;
use order_tracker::coordinator::TrackingDeps;
use order_tracker::framework::mock::{InMemoryOrderSnapshots, RecordingForeground, RecordingPresenter, StaticPermissions};
use order_tracker::framework::TrackingError;
use order_tracker::lifecycle::{setup_tracing, TrackingSystem};
use order_tracker::location::SimulatedLocationSource;
use order_tracker::model::{GeoPoint, OrderId, OrderTrackingContext, Role};
use order_tracker::platform::LocationPermission;
use order_tracker::remote::{InMemoryLocationStore, RemoteLocationChannel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

const DESTINATION: GeoPoint = GeoPoint::new(-6.200, 106.816);
const START: GeoPoint = GeoPoint::new(-6.210, 106.820);

#[tokio::main]
async fn main() -> Result<(), TrackingError> {
    setup_tracing();

    info!("Starting order tracker demo");

    let location = Arc::new(SimulatedLocationSource::new(LocationPermission::Fine));
    let store = Arc::new(InMemoryLocationStore::new());
    let presenter = Arc::new(RecordingPresenter::new());
    let snapshots = Arc::new(InMemoryOrderSnapshots::new());

    let order = OrderId::new("order_1");
    let customer_order = OrderId::new("order_1_customer_view");
    snapshots.insert(
        OrderTrackingContext::new(customer_order.clone(), Role::Customer, DESTINATION)
            .with_partner_start(START),
    );

    let deps = TrackingDeps {
        location: location.clone(),
        remote: store.clone(),
        presenter: presenter.clone(),
        foreground: Arc::new(RecordingForeground::new()),
        permissions: Arc::new(StaticPermissions::granted()),
        snapshots,
    };
    let config = TrackingConfig::from_env()
        .with_location_interval(Duration::ZERO)
        .with_min_displacement(0.0);
    let system = TrackingSystem::new(deps, config);

    // The partner passes its snapshot directly, the customer starts by id.
    let partner_ctx = OrderTrackingContext::new(order.clone(), Role::Partner, DESTINATION)
        .with_partner_start(START);
    system.client.start(order.clone(), Role::Partner, partner_ctx).await?;

    system
        .client
        .start_order(customer_order.clone(), Role::Customer)
        .await?;

    let route = [
        GeoPoint::new(-6.208, 106.819),
        GeoPoint::new(-6.205, 106.818),
        GeoPoint::new(-6.202, 106.817),
        GeoPoint::new(-6.2002, 106.8161),
    ];

    let span = tracing::info_span!("drive", %order);
    async {
        let mut written = 0;
        for point in route {
            info!(%point, "Partner moved");
            location.push(point).await;
            store.wait_for_writes(&order, written + 1, Duration::from_millis(200)).await;
            written += 1;
            if let Some(record) = store.document(&order) {
                store
                    .publish(&customer_order, record.location, record.arrived)
                    .await?;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok::<_, TrackingError>(())
    }
    .instrument(span)
    .await?;

    for id in [&order, &customer_order] {
        if let Some(last) = presenter.refreshes_for(id).last() {
            info!(order_id = %id, role = %last.role, status = %last.status, percent = last.percent, text = %last.short_text, "Final notification");
        }
    }

    info!(tracked = system.client.count().await?, "Stopping all sessions");
    system.client.stop_all().await?;
    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
