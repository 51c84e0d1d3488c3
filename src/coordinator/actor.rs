use super::{CoordinatorClient, TrackingCommand, TrackingDeps};
use crate::config::TrackingConfig;
use crate::framework::{PermissionKind, TrackingError};
use crate::model::{OrderId, OrderTrackingContext, Role};
use crate::platform::{ForegroundHost, OrderSnapshotSource, PermissionGate};
use crate::registry::SessionRegistry;
use crate::session::{SessionDeps, SessionExitNotice};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The externally visible entry point of the tracking engine.
///
/// # Architecture Note
/// This is the "server" half of an actor: it owns the [`SessionRegistry`] and
/// the foreground indicator, and processes [`TrackingCommand`]s one at a time.
/// Because commands are sequential, the registry's empty/non-empty transitions
/// and the foreground calls that follow them can never interleave with another
/// start or stop.
///
/// Sessions that die on their own report back on a second channel and are
/// reaped between commands.
///
/// # Lifecycle
///
/// 1. **Create**: [`TrackingCoordinator::new`] returns the coordinator and its
///    [`CoordinatorClient`].
/// 2. **Run**: spawn [`TrackingCoordinator::run`].
/// 3. **Teardown**: a `Shutdown` command, or dropping every client, runs
///    [`TrackingCoordinator::on_teardown`] before the loop exits.
pub struct TrackingCoordinator {
    receiver: mpsc::Receiver<TrackingCommand>,
    exits: mpsc::UnboundedReceiver<SessionExitNotice>,
    registry: SessionRegistry,
    foreground: Arc<dyn ForegroundHost>,
    permissions: Arc<dyn PermissionGate>,
    snapshots: Arc<dyn OrderSnapshotSource>,
    foreground_on: bool,
}

impl TrackingCoordinator {
    pub fn new(deps: TrackingDeps, config: TrackingConfig) -> (Self, CoordinatorClient) {
        let (sender, receiver) = mpsc::channel(config.command_buffer.max(1));
        let (exit_tx, exits) = mpsc::unbounded_channel();

        let session_deps = SessionDeps {
            location: deps.location,
            remote: deps.remote,
            presenter: deps.presenter,
            permissions: Arc::clone(&deps.permissions),
        };
        let registry = SessionRegistry::new(session_deps, config).with_exit_notices(exit_tx);

        let coordinator = Self {
            receiver,
            exits,
            registry,
            foreground: deps.foreground,
            permissions: deps.permissions,
            snapshots: deps.snapshots,
            foreground_on: false,
        };
        (coordinator, CoordinatorClient::new(sender))
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground_on
    }

    /// Processes commands until shutdown or until every client is dropped.
    pub async fn run(mut self) {
        info!("Coordinator started");

        loop {
            tokio::select! {
                Some(notice) = self.exits.recv() => self.on_session_exit(notice).await,
                command = self.receiver.recv() => match command {
                    Some(TrackingCommand::Shutdown { respond_to }) => {
                        self.on_teardown().await;
                        let _ = respond_to.send(Ok(()));
                        break;
                    }
                    Some(command) => self.dispatch(command).await,
                    None => {
                        debug!("All clients dropped");
                        self.on_teardown().await;
                        break;
                    }
                },
            }
        }

        info!("Coordinator shutdown");
    }

    async fn dispatch(&mut self, command: TrackingCommand) {
        match command {
            TrackingCommand::Start {
                order_id,
                role,
                context,
                respond_to,
            } => {
                let result = self.handle_start(order_id, role, context).await;
                let _ = respond_to.send(result);
            }
            TrackingCommand::StartOrder {
                order_id,
                role,
                respond_to,
            } => {
                let result = self.handle_start_order(order_id, role).await;
                let _ = respond_to.send(result);
            }
            TrackingCommand::StopOne {
                order_id,
                respond_to,
            } => {
                let stopped = self.handle_stop_one(&order_id).await;
                let _ = respond_to.send(Ok(stopped));
            }
            TrackingCommand::StopAll { respond_to } => {
                let stopped = self.handle_stop_all().await;
                let _ = respond_to.send(Ok(stopped));
            }
            TrackingCommand::Count { respond_to } => {
                self.reap_exited().await;
                let _ = respond_to.send(Ok(self.registry.count()));
            }
            TrackingCommand::IsTracking {
                order_id,
                respond_to,
            } => {
                self.reap_exited().await;
                let _ = respond_to.send(Ok(self.registry.is_tracking(&order_id)));
            }
            TrackingCommand::Shutdown { respond_to } => {
                self.on_teardown().await;
                let _ = respond_to.send(Ok(()));
            }
        }
    }

    /// Validates the request, raises the foreground indicator on the first
    /// session, and registers the session.
    ///
    /// Returns `Ok(false)` for an order that is already tracked.
    pub async fn handle_start(
        &mut self,
        order_id: OrderId,
        role: Role,
        context: OrderTrackingContext,
    ) -> Result<bool, TrackingError> {
        self.reap_exited().await;
        self.check_permissions(role)?;
        validate_context(&order_id, role, &context)?;

        if self.registry.is_empty() {
            self.raise_foreground();
        }

        match self.registry.start(&order_id, role, &context) {
            Ok(started) => {
                if !started {
                    debug!(%order_id, %role, "Already tracked, start ignored");
                }
                Ok(started)
            }
            Err(e) => {
                warn!(%order_id, %role, error = %e, "Start failed");
                if self.registry.is_empty() {
                    self.lower_foreground();
                }
                Err(e)
            }
        }
    }

    /// Like [`handle_start`](Self::handle_start), with the snapshot fetched from
    /// the [`OrderSnapshotSource`].
    pub async fn handle_start_order(
        &mut self,
        order_id: OrderId,
        role: Role,
    ) -> Result<bool, TrackingError> {
        let context = self
            .snapshots
            .tracking_context(&order_id, role)
            .await
            .ok_or_else(|| TrackingError::SnapshotUnavailable(order_id.clone()))?;
        self.handle_start(order_id, role, context).await
    }

    /// Stops one order; lowers the foreground indicator if it was the last.
    pub async fn handle_stop_one(&mut self, order_id: &OrderId) -> bool {
        let stopped = self.registry.stop(order_id).await;
        self.reap_exited().await;
        if self.registry.is_empty() {
            self.lower_foreground();
        }
        stopped
    }

    /// Stops every order and always releases the foreground.
    pub async fn handle_stop_all(&mut self) -> usize {
        let stopped = self.registry.stop_all().await;
        // Drain notices from sessions that died while being stopped.
        while self.exits.try_recv().is_ok() {}
        self.foreground.release_foreground();
        if self.foreground_on {
            info!("Foreground released");
        }
        self.foreground_on = false;
        stopped
    }

    /// Fallback when the host process is going away: nothing may outlive it.
    pub async fn on_teardown(&mut self) {
        let stopped = self.handle_stop_all().await;
        info!(stopped, "Teardown complete");
    }

    async fn on_session_exit(&mut self, notice: SessionExitNotice) {
        let SessionExitNotice {
            order_id,
            session_id,
            exit,
        } = notice;
        if self.registry.reap(&order_id, session_id).await {
            info!(%order_id, %session_id, ?exit, "Session ended without stop; a new start is required");
            if self.registry.is_empty() {
                self.lower_foreground();
            }
        }
    }

    /// Applies every pending exit notice.
    async fn reap_exited(&mut self) {
        while let Ok(notice) = self.exits.try_recv() {
            self.on_session_exit(notice).await;
        }
    }

    fn check_permissions(&self, role: Role) -> Result<(), TrackingError> {
        if !self.permissions.notifications_granted() {
            return Err(TrackingError::PermissionDenied(PermissionKind::Notifications));
        }
        if role == Role::Partner && !self.permissions.location_permission().is_granted() {
            return Err(TrackingError::PermissionDenied(PermissionKind::Location));
        }
        Ok(())
    }

    fn raise_foreground(&mut self) {
        if !self.foreground_on {
            self.foreground.bring_to_foreground();
            self.foreground_on = true;
            info!("Foreground raised");
        }
    }

    fn lower_foreground(&mut self) {
        if self.foreground_on {
            self.foreground.release_foreground();
            self.foreground_on = false;
            info!("Foreground released");
        }
    }
}

fn validate_context(
    order_id: &OrderId,
    role: Role,
    context: &OrderTrackingContext,
) -> Result<(), TrackingError> {
    let invalid = |reason: &str| TrackingError::InvalidContext {
        order_id: order_id.clone(),
        reason: reason.to_string(),
    };

    if order_id.is_empty() {
        return Err(invalid("empty order id"));
    }
    if &context.order_id != order_id {
        return Err(invalid("context belongs to another order"));
    }
    if context.role != role {
        return Err(invalid("context role does not match requested role"));
    }
    if !context.destination.is_valid() {
        return Err(invalid("destination coordinates out of range"));
    }
    if let Some(start) = context.partner_start_location {
        if !start.is_valid() {
            return Err(invalid("partner start coordinates out of range"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoPoint;

    const DEST: GeoPoint = GeoPoint::new(-6.200, 106.816);

    #[test]
    fn test_validate_context_accepts_complete_snapshot() {
        let id = OrderId::new("O1");
        let ctx = OrderTrackingContext::new("O1", Role::Partner, DEST)
            .with_partner_start(GeoPoint::new(-6.21, 106.82));
        assert!(validate_context(&id, Role::Partner, &ctx).is_ok());
    }

    #[test]
    fn test_validate_context_rejects_mismatches() {
        let id = OrderId::new("O1");

        let other_order = OrderTrackingContext::new("O2", Role::Partner, DEST);
        assert!(matches!(
            validate_context(&id, Role::Partner, &other_order),
            Err(TrackingError::InvalidContext { .. })
        ));

        let other_role = OrderTrackingContext::new("O1", Role::Customer, DEST);
        assert!(validate_context(&id, Role::Partner, &other_role).is_err());

        let bad_dest = OrderTrackingContext::new("O1", Role::Partner, GeoPoint::new(f64::NAN, 0.0));
        assert!(validate_context(&id, Role::Partner, &bad_dest).is_err());

        let bad_start = OrderTrackingContext::new("O1", Role::Partner, DEST)
            .with_partner_start(GeoPoint::new(120.0, 0.0));
        assert!(validate_context(&id, Role::Partner, &bad_start).is_err());

        let empty = OrderId::new("  ");
        let ctx = OrderTrackingContext::new("  ", Role::Partner, DEST);
        assert!(validate_context(&empty, Role::Partner, &ctx).is_err());
    }
}
