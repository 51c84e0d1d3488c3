//! # Location Source
//!
//! Abstraction over the device's location provider.
//!
//! The platform API is callback based and permission gated. Here it is a single
//! [`LocationSource::subscribe`] call that either fails immediately (no
//! permission) or returns a [`Subscription<GeoPoint>`] the caller drains at its
//! own pace. Cancelling the subscription guarantees nothing further is
//! delivered, whatever thread the provider calls back on.
//!
//! ## Structure
//!
//! - [`error`] - [`LocationError`]
//! - [`simulated`] - [`SimulatedLocationSource`], an in-process provider for
//!   tests and the demo binary

pub mod error;
pub mod simulated;

pub use error::*;
pub use simulated::*;

use crate::framework::Subscription;
use crate::model::GeoPoint;
use std::time::Duration;

/// What the subscriber wants from the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequest {
    /// Minimum time between two emissions.
    pub min_interval: Duration,
    /// Minimum movement between two emissions.
    pub min_displacement_meters: f64,
    /// Ask for GPS-grade fixes. Providers without fine permission degrade this.
    pub high_accuracy: bool,
}

impl LocationRequest {
    pub fn new(min_interval: Duration, min_displacement_meters: f64, high_accuracy: bool) -> Self {
        Self {
            min_interval,
            min_displacement_meters,
            high_accuracy,
        }
    }
}

/// Delivers the device's position to one subscriber per call.
pub trait LocationSource: Send + Sync {
    /// Starts position updates.
    ///
    /// # Errors
    /// [`LocationError::PermissionDenied`] when no location permission is
    /// granted. No stream is created in that case.
    fn subscribe(&self, request: LocationRequest) -> Result<Subscription<GeoPoint>, LocationError>;

    /// Asks the platform for a one-shot high-accuracy fix. Purely advisory.
    fn request_high_accuracy_fix(&self) {}
}
