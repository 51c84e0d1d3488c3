//! Geodesic math for progress estimation.
//!
//! Everything here is pure: no allocation beyond the formatted distance text,
//! no failure modes. Degenerate inputs (NaN, infinities, zero initial distance)
//! collapse to `0` instead of propagating.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A position on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two points using the haversine formula.
///
/// Symmetric, and `distance_meters(a, a) == 0.0`. Returns `0.0` when either
/// point has non-finite coordinates.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    if !(a.latitude.is_finite()
        && a.longitude.is_finite()
        && b.latitude.is_finite()
        && b.longitude.is_finite())
    {
        return 0.0;
    }

    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// Share of the initial distance already closed, as a whole percentage.
///
/// `clamp(round((initial - current) / initial * 100), 0, 100)` when `initial`
/// is positive, otherwise `0`.
pub fn progress_percent(initial: f64, current: f64) -> u8 {
    if !(initial.is_finite() && initial > 0.0) || !current.is_finite() {
        return 0;
    }
    let raw = ((initial - current) / initial * 100.0).round();
    raw.clamp(0.0, 100.0) as u8
}

/// Short remaining-distance text for a status notification.
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters <= 0.0 {
        return "0 m".to_string();
    }
    if meters < 1000.0 {
        format!("{} m", meters.round() as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Progress derived from one location event. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimate {
    pub percent: u8,
    pub current_distance_meters: f64,
}

impl ProgressEstimate {
    pub fn compute(initial_distance_meters: f64, current_distance_meters: f64) -> Self {
        Self {
            percent: progress_percent(initial_distance_meters, current_distance_meters),
            current_distance_meters,
        }
    }
}
