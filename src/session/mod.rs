//! # Tracking Sessions
//!
//! A [`TrackingSession`] is the live tracking unit for one order. It owns one
//! Tokio task that drains a single stream and turns every event into a
//! notification refresh:
//!
//! | Role | Stream | Per event |
//! |------|--------|-----------|
//! | [`Role::Partner`] | device positions from a [`LocationSource`] | publish the position (spawned), refresh progress |
//! | [`Role::Customer`] | records from a [`RemoteLocationChannel`] | refresh progress |
//!
//! ## State Machine
//!
//! ```text
//! Starting ──► Active ──► Stopping ──► Stopped
//!     │                                   ▲
//!     └──────────── start failed ─────────┘
//! ```
//!
//! [`TrackingSession::start`] either returns an `Active` session or an error;
//! nothing half-built survives a failed start. [`TrackingSession::stop`]
//! cancels the stream, joins the task, dismisses the notification and only then
//! returns. After that no refresh or publish for the order can be initiated;
//! publishes already spawned may still land.
//!
//! A session whose stream ends on its own (remote failure, provider gone) sends
//! a [`SessionExitNotice`] so its owner can reap it. It never restarts itself.

mod customer;
mod partner;
pub mod progress;

pub use progress::ProgressTracker;

use crate::config::TrackingConfig;
use crate::framework::TrackingError;
use crate::location::{LocationRequest, LocationSource};
use crate::model::{OrderId, OrderTrackingContext, Role};
use crate::platform::{LocationPermission, NotificationPresenter, PermissionGate};
use crate::remote::{RemoteLocationChannel, TransportError};
use customer::CustomerObserver;
use partner::PartnerPublisher;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Identifies one session instance. A restarted order gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Active,
    Stopping,
    Stopped,
}

/// Why a session task returned.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionExit {
    /// Stopped from outside.
    Cancelled,
    /// The source closed the stream without an error.
    StreamEnded,
    /// The remote subscription failed.
    SubscriptionTerminated(TransportError),
    /// The driver panicked; its stream was dropped with it.
    Panicked,
}

/// Sent by a session that ended without being stopped.
#[derive(Debug, Clone)]
pub struct SessionExitNotice {
    pub order_id: OrderId,
    pub session_id: SessionId,
    pub exit: SessionExit,
}

/// Collaborators every session needs.
#[derive(Clone)]
pub struct SessionDeps {
    pub location: Arc<dyn LocationSource>,
    pub remote: Arc<dyn RemoteLocationChannel>,
    pub presenter: Arc<dyn NotificationPresenter>,
    pub permissions: Arc<dyn PermissionGate>,
}

pub struct TrackingSession {
    order_id: OrderId,
    role: Role,
    session_id: SessionId,
    cancel: CancellationToken,
    stream_cancel: CancellationToken,
    state: watch::Sender<SessionState>,
    handle: Option<JoinHandle<SessionExit>>,
    presenter: Arc<dyn NotificationPresenter>,
}

impl TrackingSession {
    /// Subscribes to the role's stream and spawns the session task.
    ///
    /// `exits` receives a notice if the task ends on its own.
    pub fn start(
        session_id: SessionId,
        order_id: OrderId,
        role: Role,
        ctx: &OrderTrackingContext,
        deps: &SessionDeps,
        config: &TrackingConfig,
        exits: Option<mpsc::UnboundedSender<SessionExitNotice>>,
    ) -> Result<Self, TrackingError> {
        let (state, _) = watch::channel(SessionState::Starting);
        let span = info_span!("session", %order_id, %role, %session_id);
        let tracker = ProgressTracker::new(ctx);
        let cancel = CancellationToken::new();

        let (task, stream_cancel) = match role {
            Role::Partner => {
                let high_accuracy = deps.permissions.location_permission() == LocationPermission::Fine;
                let request = LocationRequest::new(
                    config.location_interval,
                    config.min_displacement_meters,
                    high_accuracy,
                );
                let points = deps.location.subscribe(request).map_err(|e| {
                    state.send_replace(SessionState::Stopped);
                    warn!(%order_id, error = %e, "Location subscription refused");
                    TrackingError::from(e)
                })?;
                if high_accuracy {
                    deps.location.request_high_accuracy_fix();
                }
                let stream_cancel = points.cancel_handle();
                let driver = PartnerPublisher {
                    order_id: order_id.clone(),
                    points,
                    tracker,
                    remote: Arc::clone(&deps.remote),
                    presenter: Arc::clone(&deps.presenter),
                    arrival_radius_meters: config.arrival_radius_meters,
                };
                (SessionTask::Partner(driver), stream_cancel)
            }
            Role::Customer => {
                let records = deps.remote.subscribe(&order_id).map_err(|e| {
                    state.send_replace(SessionState::Stopped);
                    warn!(%order_id, error = %e, "Remote subscription refused");
                    TrackingError::from(e)
                })?;
                let stream_cancel = records.cancel_handle();
                let driver = CustomerObserver {
                    order_id: order_id.clone(),
                    records,
                    tracker,
                    presenter: Arc::clone(&deps.presenter),
                };
                (SessionTask::Customer(driver), stream_cancel)
            }
        };

        let handle = tokio::spawn(
            task.run(cancel.clone(), order_id.clone(), session_id, exits)
                .instrument(span),
        );
        state.send_replace(SessionState::Active);
        info!(%order_id, %role, %session_id, "Session started");

        Ok(Self {
            order_id,
            role,
            session_id,
            cancel,
            stream_cancel,
            state,
            handle: Some(handle),
            presenter: Arc::clone(&deps.presenter),
        })
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// True once the session task has returned, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Cancels the stream, joins the task and dismisses the notification.
    pub async fn stop(mut self) -> SessionExit {
        self.state.send_replace(SessionState::Stopping);
        self.cancel.cancel();
        self.stream_cancel.cancel();

        let exit = match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(exit) => exit,
                Err(e) if e.is_panic() => {
                    error!(order_id = %self.order_id, session_id = %self.session_id, "Session task panicked");
                    SessionExit::Panicked
                }
                Err(_) => SessionExit::Cancelled,
            },
            None => SessionExit::Cancelled,
        };

        self.presenter.dismiss(&self.order_id);
        self.state.send_replace(SessionState::Stopped);
        info!(order_id = %self.order_id, session_id = %self.session_id, ?exit, "Session stopped");
        exit
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
            self.stream_cancel.cancel();
        }
    }
}

enum SessionTask {
    Partner(PartnerPublisher),
    Customer(CustomerObserver),
}

impl SessionTask {
    async fn run(
        self,
        cancel: CancellationToken,
        order_id: OrderId,
        session_id: SessionId,
        exits: Option<mpsc::UnboundedSender<SessionExitNotice>>,
    ) -> SessionExit {
        // The driver runs in its own task so a panic in a collaborator still
        // produces an exit notice.
        let driver = tokio::spawn(
            async move {
                match self {
                    SessionTask::Partner(driver) => driver.run(cancel).await,
                    SessionTask::Customer(driver) => driver.run(cancel).await,
                }
            }
            .in_current_span(),
        );
        let exit = match driver.await {
            Ok(exit) => exit,
            Err(e) if e.is_panic() => {
                error!("Session driver panicked");
                SessionExit::Panicked
            }
            Err(_) => SessionExit::Cancelled,
        };

        if exit != SessionExit::Cancelled {
            debug!(?exit, "Session ended on its own");
            if let Some(exits) = exits {
                let _ = exits.send(SessionExitNotice {
                    order_id,
                    session_id,
                    exit: exit.clone(),
                });
            }
        }
        exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{RecordingPresenter, StaticPermissions};
    use crate::framework::PermissionKind;
    use crate::location::SimulatedLocationSource;
    use crate::model::{GeoPoint, TrackingNotification};
    use crate::remote::InMemoryLocationStore;
    use std::time::Duration;

    const DEST: GeoPoint = GeoPoint::new(-6.200, 106.816);

    struct PanickingPresenter;

    impl NotificationPresenter for PanickingPresenter {
        fn refresh(&self, _notification: TrackingNotification) {
            panic!("presenter exploded");
        }

        fn dismiss(&self, _order_id: &OrderId) {}
    }

    fn deps(location: SimulatedLocationSource, presenter: Arc<dyn NotificationPresenter>) -> SessionDeps {
        SessionDeps {
            location: Arc::new(location),
            remote: Arc::new(InMemoryLocationStore::new()),
            presenter,
            permissions: Arc::new(StaticPermissions::granted()),
        }
    }

    fn start(role: Role, deps: &SessionDeps, exits: Option<mpsc::UnboundedSender<SessionExitNotice>>) -> Result<TrackingSession, TrackingError> {
        let ctx = OrderTrackingContext::new("A", role, DEST);
        let config = TrackingConfig::default()
            .with_location_interval(Duration::ZERO)
            .with_min_displacement(0.0);
        TrackingSession::start(SessionId(1), OrderId::new("A"), role, &ctx, deps, &config, exits)
    }

    #[tokio::test]
    async fn test_state_moves_through_stopping_to_stopped() {
        let deps = deps(
            SimulatedLocationSource::new(LocationPermission::Fine),
            Arc::new(RecordingPresenter::new()),
        );
        let session = start(Role::Partner, &deps, None).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(!session.is_finished());

        let mut rx = session.subscribe_state();
        let observer = tokio::spawn(async move {
            let mut seen = vec![];
            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();
                seen.push(state);
                if state == SessionState::Stopped {
                    break;
                }
            }
            seen
        });

        assert_eq!(session.stop().await, SessionExit::Cancelled);
        let seen = observer.await.unwrap();
        assert_eq!(seen, vec![SessionState::Stopping, SessionState::Stopped]);
    }

    #[tokio::test]
    async fn test_refused_subscription_fails_start() {
        let location = SimulatedLocationSource::new(LocationPermission::Denied);
        let deps = deps(location.clone(), Arc::new(RecordingPresenter::new()));

        let result = start(Role::Partner, &deps, None);

        assert!(matches!(
            result,
            Err(TrackingError::PermissionDenied(PermissionKind::Location))
        ));
        assert_eq!(location.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_panicking_driver_sends_exit_notice() {
        let location = SimulatedLocationSource::new(LocationPermission::Fine);
        let deps = deps(location.clone(), Arc::new(PanickingPresenter));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = start(Role::Partner, &deps, Some(tx)).unwrap();

        location.push(DEST).await;

        let notice = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("No exit notice")
            .expect("Exit channel closed");
        assert_eq!(notice.order_id, OrderId::new("A"));
        assert_eq!(notice.session_id, SessionId(1));
        assert_eq!(notice.exit, SessionExit::Panicked);
        assert_eq!(location.subscriber_count(), 0);

        assert_eq!(session.stop().await, SessionExit::Panicked);
    }
}
