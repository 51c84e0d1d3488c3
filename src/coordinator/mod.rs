//! # Tracking Coordinator
//!
//! The command API of the engine and the owner of the shared background-process
//! lifecycle.
//!
//! ## Structure
//!
//! - [`actor`] - [`TrackingCoordinator`], the command loop
//! - [`client`] - [`CoordinatorClient`], the handle callers hold
//! - [`message`] - [`TrackingCommand`]
//!
//! ## Foreground Rule
//!
//! The foreground indicator is raised when the first session starts (0→1) and
//! released when the last one goes away (1→0), whether by `StopOne`, `StopAll`,
//! teardown, or a session dying on its own. Sessions never touch it.
//!
//! ## Usage
//!
//! ```rust
//! use order_tracker::coordinator::{TrackingCoordinator, TrackingDeps};
//! use order_tracker::config::TrackingConfig;
//! use order_tracker::framework::mock::*;
//! use order_tracker::location::SimulatedLocationSource;
//! use order_tracker::model::{GeoPoint, OrderId, OrderTrackingContext, Role};
//! use order_tracker::platform::LocationPermission;
//! use order_tracker::remote::InMemoryLocationStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let deps = TrackingDeps {
//!         location: Arc::new(SimulatedLocationSource::new(LocationPermission::Fine)),
//!         remote: Arc::new(InMemoryLocationStore::new()),
//!         presenter: Arc::new(RecordingPresenter::new()),
//!         foreground: Arc::new(RecordingForeground::new()),
//!         permissions: Arc::new(StaticPermissions::granted()),
//!         snapshots: Arc::new(InMemoryOrderSnapshots::new()),
//!     };
//!     let (coordinator, client) = TrackingCoordinator::new(deps, TrackingConfig::default());
//!     tokio::spawn(coordinator.run());
//!
//!     let ctx = OrderTrackingContext::new("O1", Role::Customer, GeoPoint::new(-6.2, 106.816));
//!     assert!(client.start(OrderId::new("O1"), Role::Customer, ctx).await.unwrap());
//!     assert_eq!(client.count().await.unwrap(), 1);
//!     client.shutdown().await.unwrap();
//! }
//! ```

pub mod actor;
pub mod client;
pub mod message;

pub use actor::TrackingCoordinator;
pub use client::CoordinatorClient;
pub use message::TrackingCommand;

use crate::location::LocationSource;
use crate::platform::{ForegroundHost, NotificationPresenter, OrderSnapshotSource, PermissionGate};
use crate::remote::RemoteLocationChannel;
use std::sync::Arc;

/// Every collaborator the coordinator and its sessions use.
#[derive(Clone)]
pub struct TrackingDeps {
    pub location: Arc<dyn LocationSource>,
    pub remote: Arc<dyn RemoteLocationChannel>,
    pub presenter: Arc<dyn NotificationPresenter>,
    pub foreground: Arc<dyn ForegroundHost>,
    pub permissions: Arc<dyn PermissionGate>,
    pub snapshots: Arc<dyn OrderSnapshotSource>,
}
