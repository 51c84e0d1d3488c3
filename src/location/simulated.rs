//! In-process location provider driven by [`SimulatedLocationSource::push`].
//!
//! Behaves like the platform provider as far as subscribers can tell: it is
//! permission gated, degrades high-accuracy requests under coarse permission,
//! and applies each subscriber's minimum interval and displacement before
//! emitting.

use super::{LocationError, LocationRequest, LocationSource};
use crate::framework::subscription::{self, Emitter, Subscription};
use crate::model::{distance_meters, GeoPoint};
use crate::platform::LocationPermission;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_BUFFER: usize = 64;

struct Listener {
    request: LocationRequest,
    emitter: Emitter<GeoPoint>,
    last_emitted: Option<(Instant, GeoPoint)>,
}

impl Listener {
    fn accepts(&self, point: GeoPoint, now: Instant) -> bool {
        match self.last_emitted {
            None => true,
            Some((at, last)) => {
                now.duration_since(at) >= self.request.min_interval
                    && distance_meters(last, point) >= self.request.min_displacement_meters
            }
        }
    }
}

struct SourceState {
    permission: LocationPermission,
    /// Set while the provider is switched off.
    unavailable: Option<String>,
    listeners: Vec<Listener>,
    last_request: Option<LocationRequest>,
    fix_requests: usize,
}

/// A [`LocationSource`] whose positions come from the test or demo driving it.
#[derive(Clone)]
pub struct SimulatedLocationSource {
    state: Arc<Mutex<SourceState>>,
    buffer: usize,
}

impl SimulatedLocationSource {
    pub fn new(permission: LocationPermission) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState {
                permission,
                unavailable: None,
                listeners: Vec::new(),
                last_request: None,
                fix_requests: 0,
            })),
            buffer: DEFAULT_BUFFER,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_permission(&self, permission: LocationPermission) {
        self.lock().permission = permission;
    }

    /// Makes subscribes fail with [`LocationError::Unavailable`] until cleared
    /// with `None`. Existing subscribers are unaffected.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.lock().unavailable = reason.map(str::to_string);
    }

    /// Feeds a new device position to every live subscriber whose filters
    /// accept it. Returns how many subscribers received it.
    pub async fn push(&self, point: GeoPoint) -> usize {
        let now = Instant::now();
        let targets: Vec<Emitter<GeoPoint>> = {
            let mut state = self.lock();
            state.listeners.retain(|l| !l.emitter.is_closed());
            state
                .listeners
                .iter_mut()
                .filter(|l| l.accepts(point, now))
                .map(|l| {
                    l.last_emitted = Some((now, point));
                    l.emitter.clone()
                })
                .collect()
        };

        let mut delivered = 0;
        for emitter in targets {
            if emitter.emit(point).await {
                delivered += 1;
            }
        }
        debug!(%point, delivered, "Simulated fix pushed");
        delivered
    }

    /// Subscribers that have not cancelled yet.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.listeners.retain(|l| !l.emitter.is_closed());
        state.listeners.len()
    }

    /// The effective request of the most recent subscription.
    pub fn last_request(&self) -> Option<LocationRequest> {
        self.lock().last_request
    }

    pub fn fix_requests(&self) -> usize {
        self.lock().fix_requests
    }
}

impl LocationSource for SimulatedLocationSource {
    fn subscribe(&self, request: LocationRequest) -> Result<Subscription<GeoPoint>, LocationError> {
        let mut state = self.lock();
        let effective = match state.permission {
            LocationPermission::Denied => return Err(LocationError::PermissionDenied),
            _ if state.unavailable.is_some() => {
                let reason = state.unavailable.clone().unwrap_or_default();
                return Err(LocationError::Unavailable(reason));
            }
            LocationPermission::Coarse if request.high_accuracy => {
                debug!("Coarse permission only, degrading request accuracy");
                LocationRequest {
                    high_accuracy: false,
                    ..request
                }
            }
            _ => request,
        };

        let (emitter, subscription) = subscription::channel(self.buffer);
        state.listeners.push(Listener {
            request: effective,
            emitter,
            last_emitted: None,
        });
        state.last_request = Some(effective);
        Ok(subscription)
    }

    fn request_high_accuracy_fix(&self) {
        self.lock().fix_requests += 1;
    }
}
