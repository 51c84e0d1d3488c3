//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`TrackingSystem`] - spawns the coordinator and owns its task
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod tracing;
pub mod tracking_system;

pub use self::tracing::*;
pub use tracking_system::*;
