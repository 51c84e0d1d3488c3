//! Error types for location providers.

use thiserror::Error;

/// Errors a [`LocationSource`](super::LocationSource) can return at subscribe time.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocationError {
    /// Neither fine nor coarse location has been granted.
    #[error("Location permission not granted")]
    PermissionDenied,

    /// The provider exists but cannot deliver fixes right now.
    #[error("Location provider unavailable: {0}")]
    Unavailable(String),
}
