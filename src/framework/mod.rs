//! Shared plumbing for the tracking engine.
//!
//! # Main Components
//!
//! - [`Subscription`] / [`Emitter`] - cancellable push streams used by every
//!   collaborator that delivers events
//! - [`TrackingError`] - errors surfaced to callers at start time
//! - [`Response`] - one-shot reply channel used by the coordinator's commands
//!
//! # Testing
//!
//! See [`mock`] for in-memory collaborators.

pub mod error;
pub mod mock;
pub mod subscription;

pub use error::*;
pub use subscription::{Emitter, Subscription};

use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the coordinator.
pub type Response<T> = oneshot::Sender<Result<T, TrackingError>>;
