use crate::config::TrackingConfig;
use crate::coordinator::{CoordinatorClient, TrackingCoordinator, TrackingDeps};
use crate::framework::TrackingError;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The runtime orchestrator for the tracking engine.
///
/// `TrackingSystem` is responsible for:
/// - **Lifecycle Management**: spawning the coordinator and waiting for it on shutdown
/// - **Dependency Wiring**: handing the platform collaborators to the coordinator
///
/// # Example
///
/// ```ignore
/// let system = TrackingSystem::new(deps, TrackingConfig::from_env());
///
/// system.client.start(order_id, Role::Partner, context).await?;
///
/// // Stops every session and releases the foreground
/// system.shutdown().await?;
/// ```
pub struct TrackingSystem {
    /// Client for sending commands to the coordinator
    pub client: CoordinatorClient,

    handle: JoinHandle<()>,
}

impl TrackingSystem {
    /// Spawns the coordinator in its own Tokio task.
    pub fn new(deps: TrackingDeps, config: TrackingConfig) -> Self {
        let (coordinator, client) = TrackingCoordinator::new(deps, config);
        let handle = tokio::spawn(coordinator.run());
        Self { client, handle }
    }

    /// Gracefully shuts down the engine.
    ///
    /// Sends `Shutdown`, which stops every session and releases the foreground,
    /// then waits for the coordinator task.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the coordinator exited cleanly
    /// - `Err(TrackingError::TaskFailed)` if its task panicked
    pub async fn shutdown(self) -> Result<(), TrackingError> {
        info!("Shutting down tracking system...");

        // An already-exited coordinator is fine; the join below reports panics.
        if let Err(e) = self.client.shutdown().await {
            info!(error = %e, "Coordinator already gone");
        }
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Coordinator task failed: {:?}", e);
            return Err(TrackingError::TaskFailed(e.to_string()));
        }

        info!("Tracking system shutdown complete.");
        Ok(())
    }
}
