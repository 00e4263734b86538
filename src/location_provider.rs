use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::geo::LocationSample;

/* The platform location stack (permission prompt, one-shot fixes, and the
continuous watch) lives on the embedding side; the service only sees these
traits. */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    High,
    Balanced,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub accuracy: Accuracy,
    pub min_interval: Duration,
    pub min_distance_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            accuracy: Accuracy::High,
            min_interval: Duration::from_secs(5),
            min_distance_m: 10.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Handle for an active watch. `cancel` must release the platform
/// subscription; no sample may be delivered after it returns.
pub trait LocationSubscription: Send {
    fn cancel(self: Box<Self>);
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, ProviderError>;

    async fn current_fix(&self, accuracy: Accuracy) -> Result<LocationSample, ProviderError>;

    /// Register a continuous position watch delivering samples into
    /// `sink` until the returned subscription is cancelled.
    async fn watch(
        &self,
        options: WatchOptions,
        sink: mpsc::Sender<LocationSample>,
    ) -> Result<Box<dyn LocationSubscription>, ProviderError>;
}
