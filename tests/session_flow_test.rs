mod common;

use common::*;
use order_tracker::framework::mock::PresenterEvent;
use order_tracker::model::{GeoPoint, LiveLocationRecord, OrderId, OrderTrackingContext, Role, TrackingStatus};
use order_tracker::remote::RemoteLocationChannel;
use std::time::Duration;

/// Polls until the store has seen `expected` publish calls.
async fn wait_for_attempts(h: &Harness, expected: usize) -> usize {
    let deadline = tokio::time::Instant::now() + WAIT;
    while h.store.publish_attempts() < expected && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    h.store.publish_attempts()
}

#[tokio::test]
async fn test_partner_publishes_and_shows_progress() {
    let h = Harness::new();
    let order = OrderId::new("O1");
    h.system
        .client
        .start(order.clone(), Role::Partner, partner_ctx("O1"))
        .await
        .expect("Failed to start partner session");

    assert_eq!(h.location.push(MIDWAY).await, 1);

    let writes = h.store.wait_for_writes(&order, 1, WAIT).await;
    assert_eq!(writes, vec![LiveLocationRecord::new(MIDWAY, false)]);

    let refreshes = h.presenter.wait_for_refreshes(&order, 1, WAIT).await;
    assert_eq!(refreshes.len(), 1);
    let n = &refreshes[0];
    assert_eq!(n.role, Role::Partner);
    assert_eq!(n.status, TrackingStatus::OnTheWay);
    assert!(n.percent > 0 && n.percent < 100, "percent was {}", n.percent);
    assert!(n.short_text.ends_with(" m") || n.short_text.ends_with(" km"));

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_partner_marks_arrival_inside_radius() {
    let h = Harness::new();
    let order = OrderId::new("O1");
    h.system
        .client
        .start(order.clone(), Role::Partner, partner_ctx("O1"))
        .await
        .unwrap();

    h.location.push(MIDWAY).await;
    h.location.push(DEST).await;

    let writes = h.store.wait_for_writes(&order, 2, WAIT).await;
    assert!(writes.contains(&LiveLocationRecord::new(DEST, true)));

    let refreshes = h.presenter.wait_for_refreshes(&order, 2, WAIT).await;
    let last = refreshes.last().expect("No refresh");
    assert_eq!(last.status, TrackingStatus::Arrived);
    assert_eq!(last.percent, 100);

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_customer_at_destination_reads_zero_progress() {
    let h = Harness::new();
    let order = OrderId::new("O2");
    let spot = GeoPoint::new(-6.195, 106.822);
    h.system
        .client
        .start(
            order.clone(),
            Role::Customer,
            OrderTrackingContext::new("O2", Role::Customer, spot),
        )
        .await
        .unwrap();

    h.store.publish(&order, spot, false).await.unwrap();
    h.store.publish(&order, spot, false).await.unwrap();

    let refreshes = h.presenter.wait_for_refreshes(&order, 2, WAIT).await;
    assert_eq!(refreshes.len(), 2);
    assert!(refreshes.iter().all(|n| n.percent == 0));
    assert!(refreshes.iter().all(|n| n.role == Role::Customer));

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_customer_follows_partner_records() {
    let h = Harness::new();
    let order = OrderId::new("O4");
    // Written before the customer attaches; delivered as the current snapshot.
    h.store.publish(&order, START, false).await.unwrap();

    h.system
        .client
        .start(order.clone(), Role::Customer, customer_ctx("O4"))
        .await
        .unwrap();
    let first = h.presenter.wait_for_refreshes(&order, 1, WAIT).await;
    assert_eq!(first[0].percent, 0);

    h.store.publish(&order, MIDWAY, false).await.unwrap();
    h.store.publish(&order, DEST, true).await.unwrap();

    let refreshes = h.presenter.wait_for_refreshes(&order, 3, WAIT).await;
    assert_eq!(refreshes.len(), 3);
    assert!(refreshes[1].percent > 0 && refreshes[1].percent < 100);
    assert_eq!(refreshes[2].status, TrackingStatus::Arrived);
    assert_eq!(refreshes[2].percent, 100);

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sessions_do_not_see_each_others_updates() {
    let h = Harness::new();
    let client = &h.system.client;
    let a = OrderId::new("A");
    let b = OrderId::new("B");
    client.start(a.clone(), Role::Customer, customer_ctx("A")).await.unwrap();
    client.start(b.clone(), Role::Customer, customer_ctx("B")).await.unwrap();

    h.store.publish(&a, MIDWAY, false).await.unwrap();
    h.presenter.wait_for_refreshes(&a, 1, WAIT).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.presenter.refreshes_for(&a).len(), 1);
    assert!(h.presenter.refreshes_for(&b).is_empty());

    // Stopping one leaves the other running.
    client.stop_one(a.clone()).await.unwrap();
    h.store.publish(&b, MIDWAY, false).await.unwrap();
    assert_eq!(h.presenter.wait_for_refreshes(&b, 1, WAIT).await.len(), 1);
    assert_eq!(h.presenter.dismissals(&b), 0);

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_no_refresh_after_stop_while_publish_in_flight() {
    let h = Harness::new();
    let order = OrderId::new("O1");
    h.system
        .client
        .start(order.clone(), Role::Partner, partner_ctx("O1"))
        .await
        .unwrap();

    h.store.pause_publishes();
    h.location.push(MIDWAY).await;
    h.presenter.wait_for_refreshes(&order, 1, WAIT).await;
    assert_eq!(wait_for_attempts(&h, 1).await, 1);

    assert!(h.system.client.stop_one(order.clone()).await.unwrap());
    assert!(matches!(
        h.presenter.events().last(),
        Some(PresenterEvent::Dismiss(id)) if id == &order
    ));

    // Nothing reaches the stopped session.
    assert_eq!(h.location.push(START).await, 0);

    // The in-flight write is allowed to land.
    h.store.resume_publishes();
    let writes = h.store.wait_for_writes(&order, 1, WAIT).await;
    assert_eq!(writes, vec![LiveLocationRecord::new(MIDWAY, false)]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.presenter.refreshes_for(&order).len(), 1);
    assert!(matches!(
        h.presenter.events().last(),
        Some(PresenterEvent::Dismiss(_))
    ));

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_publish_keeps_session_alive() {
    let h = Harness::new();
    let order = OrderId::new("O1");
    h.system
        .client
        .start(order.clone(), Role::Partner, partner_ctx("O1"))
        .await
        .unwrap();

    h.store.fail_publishes(true);
    h.location.push(MIDWAY).await;
    assert_eq!(h.presenter.wait_for_refreshes(&order, 1, WAIT).await.len(), 1);
    assert_eq!(wait_for_attempts(&h, 1).await, 1);
    assert!(h.store.writes_for(&order).is_empty());

    h.store.fail_publishes(false);
    h.location.push(DEST).await;
    let writes = h.store.wait_for_writes(&order, 1, WAIT).await;
    assert_eq!(writes, vec![LiveLocationRecord::new(DEST, true)]);
    assert!(h.system.client.is_tracking(order.clone()).await.unwrap());

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_broken_subscription_ends_only_that_session() {
    let h = Harness::new();
    let client = &h.system.client;
    let broken = OrderId::new("O3");
    let healthy = OrderId::new("O5");
    client.start(broken.clone(), Role::Customer, customer_ctx("O3")).await.unwrap();
    client.start(healthy.clone(), Role::Customer, customer_ctx("O5")).await.unwrap();

    assert_eq!(h.store.break_subscriptions(&broken, "connection reset").await, 1);

    assert_eq!(wait_for_count(&h, 1).await, 1);
    assert!(!client.is_tracking(broken.clone()).await.unwrap());
    assert!(client.is_tracking(healthy.clone()).await.unwrap());
    assert!(h.presenter.wait_for_dismissal(&broken, WAIT).await);
    assert!(h.foreground.is_on());

    // A fresh start recovers.
    assert!(client
        .start(broken.clone(), Role::Customer, customer_ctx("O3"))
        .await
        .unwrap());
    assert_eq!(h.store.listener_count(&broken), 1);

    h.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_last_session_dying_releases_foreground() {
    let h = Harness::new();
    let order = OrderId::new("O3");
    h.system
        .client
        .start(order.clone(), Role::Customer, customer_ctx("O3"))
        .await
        .unwrap();
    assert!(h.foreground.is_on());

    h.store.break_subscriptions(&order, "permission revoked").await;

    assert_eq!(wait_for_count(&h, 0).await, 0);
    assert!(!h.foreground.is_on());
    assert_eq!(h.foreground.times_released(), 1);

    h.system.shutdown().await.unwrap();
}

struct PanickingPresenter;

impl order_tracker::platform::NotificationPresenter for PanickingPresenter {
    fn refresh(&self, _notification: order_tracker::model::TrackingNotification) {
        panic!("presenter exploded");
    }

    fn dismiss(&self, _order_id: &OrderId) {}
}

#[tokio::test]
async fn test_panicking_session_is_reaped() {
    use order_tracker::config::TrackingConfig;
    use order_tracker::coordinator::{TrackingCoordinator, TrackingDeps};
    use order_tracker::framework::mock::{InMemoryOrderSnapshots, RecordingForeground, StaticPermissions};
    use order_tracker::location::SimulatedLocationSource;
    use order_tracker::platform::LocationPermission;
    use order_tracker::remote::InMemoryLocationStore;
    use std::sync::Arc;

    let location = Arc::new(SimulatedLocationSource::new(LocationPermission::Fine));
    let foreground = Arc::new(RecordingForeground::new());
    let deps = TrackingDeps {
        location: location.clone(),
        remote: Arc::new(InMemoryLocationStore::new()),
        presenter: Arc::new(PanickingPresenter),
        foreground: foreground.clone(),
        permissions: Arc::new(StaticPermissions::granted()),
        snapshots: Arc::new(InMemoryOrderSnapshots::new()),
    };
    let config = TrackingConfig::default()
        .with_location_interval(Duration::ZERO)
        .with_min_displacement(0.0);
    let (coordinator, client) = TrackingCoordinator::new(deps, config);
    let handle = tokio::spawn(coordinator.run());

    let order = OrderId::new("A");
    client
        .start(order.clone(), Role::Partner, partner_ctx("A"))
        .await
        .unwrap();
    assert!(foreground.is_on());

    location.push(MIDWAY).await;

    let deadline = tokio::time::Instant::now() + WAIT;
    while client.count().await.unwrap() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(client.count().await.unwrap(), 0);
    assert!(!client.is_tracking(order.clone()).await.unwrap());
    assert!(!foreground.is_on());
    assert_eq!(location.subscriber_count(), 0);

    // The order can be tracked again.
    assert!(client
        .start(order.clone(), Role::Partner, partner_ctx("A"))
        .await
        .unwrap());

    drop(client);
    handle.await.unwrap();
}
