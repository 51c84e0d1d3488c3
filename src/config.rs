//! Tunables for the tracking engine.
//!
//! Defaults match what the mobile client ships with. Hosts can override them
//! in code with the `with_*` builders, from a config document via serde, or
//! from the environment with [`TrackingConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const ENV_LOCATION_INTERVAL_SECS: &str = "TRACKING_LOCATION_INTERVAL_SECS";
pub const ENV_MIN_DISPLACEMENT_M: &str = "TRACKING_MIN_DISPLACEMENT_M";
pub const ENV_ARRIVAL_RADIUS_M: &str = "TRACKING_ARRIVAL_RADIUS_M";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum time between two partner location fixes.
    #[serde(with = "duration_secs", rename = "location_interval_secs")]
    pub location_interval: Duration,
    /// Minimum partner movement before a new fix is emitted.
    pub min_displacement_meters: f64,
    /// Within this distance of the destination the partner counts as arrived.
    pub arrival_radius_meters: f64,
    /// Capacity of the coordinator's command channel.
    pub command_buffer: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            location_interval: Duration::from_secs(60),
            min_displacement_meters: 20.0,
            arrival_radius_meters: 50.0,
            command_buffer: 32,
        }
    }
}

impl TrackingConfig {
    pub fn with_location_interval(mut self, interval: Duration) -> Self {
        self.location_interval = interval;
        self
    }

    pub fn with_min_displacement(mut self, meters: f64) -> Self {
        self.min_displacement_meters = meters;
        self
    }

    pub fn with_arrival_radius(mut self, meters: f64) -> Self {
        self.arrival_radius_meters = meters;
        self
    }

    pub fn with_command_buffer(mut self, capacity: usize) -> Self {
        self.command_buffer = capacity;
        self
    }

    /// Defaults overridden by any `TRACKING_*` variables that parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_LOCATION_INTERVAL_SECS) {
            config.location_interval = Duration::from_secs(secs);
        }
        if let Some(meters) = parse_var::<f64>(&lookup, ENV_MIN_DISPLACEMENT_M) {
            config.min_displacement_meters = meters;
        }
        if let Some(meters) = parse_var::<f64>(&lookup, ENV_ARRIVAL_RADIUS_M) {
            config.arrival_radius_meters = meters;
        }
        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable config override");
            None
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
