use thiserror::Error;

/// Failures crossing the service boundary. Raw provider, network, and
/// storage errors are translated into these before reaching callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Location permission not granted. Fatal to fix/tracking operations
    /// until the user re-grants it.
    #[error("location permission denied")]
    PermissionDenied,

    /// A fix or current-location read could not complete. Recoverable,
    /// callers may retry.
    #[error("current location unavailable")]
    LocationUnavailable,

    /// Both geocoding tiers failed for the given query. Recoverable,
    /// callers should prompt the user to refine the input.
    #[error("no geocoding result for \"{query}\"")]
    GeocodeNotFound { query: String },

    /// Marker input rejected before any resolution happened.
    #[error("invalid marker: {0}")]
    InvalidMarker(&'static str),

    /// Durable read/write failed. In-memory state stays authoritative for
    /// the session.
    #[error("storage failure: {0}")]
    Persistence(String),
}
