use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::export::ExportBundle;
use crate::geo::{self, Coordinate, LocationSample};
use crate::geocoder::{GeocodingGateway, PlaceHit};
use crate::location_provider::{
    Accuracy, LocationProvider, LocationSubscription, PermissionStatus, ProviderError, WatchOptions,
};
use crate::marker::{LocationRequest, Marker, MarkerDraft, CURRENT_LOCATION_ADDRESS};
use crate::route::Route;
use crate::stats::{self, HistorySummary, UsageStats};
use crate::store::{Collection, Store};

/* The core orchestrator. One owned instance per app (injected into the
presentation layer, no global), holding every piece of mutable state
behind a single mutex: the marker and route collections, the current
location, the tracking flag, the capped location history, and the
persistent error message.

All mutation goes through this instance, so user-initiated calls and
watch-subscription callbacks serialize on the state lock. Durable writes
are best-effort relative to memory: see `Applied`. */

pub const MAX_HISTORY_SAMPLES: usize = 10_000;

const WATCH_CHANNEL_CAPACITY: usize = 32;

/// Outcome of a mutation. The in-memory change always applies; the
/// durable write is best-effort and reported here instead of rolled back.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied<T> {
    pub value: T,
    pub persisted: bool,
}

#[derive(Default)]
struct ServiceState {
    current_location: Option<LocationSample>,
    is_tracking: bool,
    markers: Vec<Marker>,
    routes: Vec<Route>,
    location_history: Vec<LocationSample>,
    error_message: Option<String>,
}

struct WatchSession {
    subscription: Box<dyn LocationSubscription>,
    forwarder: JoinHandle<()>,
}

pub struct LocationService {
    provider: Arc<dyn LocationProvider>,
    geocoder: GeocodingGateway,
    store: Store,
    state: Arc<Mutex<ServiceState>>,
    // Async mutex: held across `provider.watch`, so a concurrent
    // `start_tracking` cannot race a second subscription into existence.
    watch: tokio::sync::Mutex<Option<WatchSession>>,
}

fn new_id() -> String {
    Uuid::new_v4().as_hyphenated().to_string()
}

fn of_provider_error(error: ProviderError) -> ServiceError {
    match error {
        ProviderError::PermissionDenied => ServiceError::PermissionDenied,
        ProviderError::Unavailable(_) => ServiceError::LocationUnavailable,
    }
}

impl LocationService {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        geocoder: GeocodingGateway,
        store: Store,
    ) -> Self {
        LocationService {
            provider,
            geocoder,
            store,
            state: Arc::new(Mutex::new(ServiceState::default())),
            watch: tokio::sync::Mutex::new(None),
        }
    }

    /// Startup: load the durable collections, then resolve permission and
    /// take one immediate fix when granted. Permission is always settled
    /// before the first fix is attempted.
    pub async fn initialize(&self) {
        let markers = self.store.load_collection(Collection::Markers);
        let routes = self.store.load_collection(Collection::Routes);
        {
            let mut state = self.state.lock().unwrap();
            state.markers = markers;
            state.routes = routes;
        }

        match self.provider.request_permission().await {
            Ok(PermissionStatus::Granted) => {
                if let Err(error) = self.refresh_current_location().await {
                    warn!("[service] initial fix failed: {}", error);
                }
            }
            Ok(PermissionStatus::Denied) => {
                self.set_error("Location permission denied");
            }
            Err(error) => {
                warn!("[service] permission request failed: {}", error);
                self.set_error("Failed to request location permission");
            }
        }
        info!("initialized");
    }

    /// One high-accuracy fix. Updates the current location and clears the
    /// error on success; no automatic retry on failure.
    pub async fn refresh_current_location(&self) -> Result<LocationSample, ServiceError> {
        match self.provider.current_fix(Accuracy::High).await {
            Ok(sample) => {
                let mut state = self.state.lock().unwrap();
                state.current_location = Some(sample.clone());
                state.error_message = None;
                Ok(sample)
            }
            Err(error) => {
                self.set_error("Failed to get current location");
                Err(of_provider_error(error))
            }
        }
    }

    /// Start the continuous position watch. A no-op when already
    /// tracking: there is never more than one live subscription.
    pub async fn start_tracking(&self) -> Result<(), ServiceError> {
        let mut slot = self.watch.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let subscription = self
            .provider
            .watch(WatchOptions::default(), tx)
            .await
            .map_err(|error| {
                self.set_error("Failed to start location tracking");
                of_provider_error(error)
            })?;

        let state = Arc::clone(&self.state);
        let forwarder = tokio::spawn(async move {
            while let Some(sample) = rx.recv().await {
                let mut state = state.lock().unwrap();
                state.current_location = Some(sample.clone());
                state.location_history.push(sample);
                let len = state.location_history.len();
                if len > MAX_HISTORY_SAMPLES {
                    state.location_history.drain(..len - MAX_HISTORY_SAMPLES);
                }
            }
        });

        self.state.lock().unwrap().is_tracking = true;
        *slot = Some(WatchSession {
            subscription,
            forwarder,
        });
        info!("[service] tracking started");
        Ok(())
    }

    /// Cancel the watch. Idempotent; no sample lands after this returns.
    pub async fn stop_tracking(&self) {
        let mut slot = self.watch.lock().await;
        if let Some(session) = slot.take() {
            session.subscription.cancel();
            session.forwarder.abort();
            info!("[service] tracking stopped");
        }
        self.state.lock().unwrap().is_tracking = false;
    }

    /// Create a marker from a draft, resolving its coordinates, then
    /// append and persist.
    pub async fn add_marker(&self, draft: MarkerDraft) -> Result<Applied<Marker>, ServiceError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidMarker("name must not be empty"));
        }

        let (coordinate, address) = match draft.location {
            LocationRequest::CurrentLocation => {
                let current = self.state.lock().unwrap().current_location.clone();
                match current {
                    Some(sample) => (sample.coordinate, CURRENT_LOCATION_ADDRESS.to_string()),
                    None => return Err(ServiceError::LocationUnavailable),
                }
            }
            LocationRequest::Address(address) => {
                let resolved = self.geocoder.geocode(&address).await?;
                (resolved.coordinate, resolved.formatted_address)
            }
            LocationRequest::Position(coordinate) => {
                if !coordinate.is_valid() {
                    return Err(ServiceError::InvalidMarker("coordinate out of range"));
                }
                (
                    coordinate,
                    format!("{:.4}, {:.4}", coordinate.latitude, coordinate.longitude),
                )
            }
        };

        let marker = Marker {
            id: new_id(),
            name: name.to_string(),
            address,
            description: draft.description.trim().to_string(),
            category: draft.category,
            coordinate,
            created_at: Utc::now(),
        };

        let persisted = {
            let mut state = self.state.lock().unwrap();
            state.markers.push(marker.clone());
            self.persist_markers(&state)
        };
        Ok(Applied {
            value: marker,
            persisted,
        })
    }

    /// Remove a marker by id. An absent id is a no-op success, so
    /// deletion stays idempotent.
    pub fn remove_marker(&self, id: &str) -> Applied<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.markers.len();
        state.markers.retain(|marker| marker.id != id);
        let removed = state.markers.len() != before;
        let persisted = if removed {
            self.persist_markers(&state)
        } else {
            true
        };
        Applied {
            value: removed,
            persisted,
        }
    }

    /// Remove a route by id, with the same idempotent contract as
    /// `remove_marker`.
    pub fn remove_route(&self, id: &str) -> Applied<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.routes.len();
        state.routes.retain(|route| route.id != id);
        let removed = state.routes.len() != before;
        let persisted = if removed {
            self.persist_routes(&state)
        } else {
            true
        };
        Applied {
            value: removed,
            persisted,
        }
    }

    /// Synthesize a straight-line route. Deterministic in its inputs
    /// aside from id and timestamp assignment.
    pub fn calculate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        destination_name: Option<String>,
    ) -> Applied<Route> {
        let distance_km = geo::distance_km(&origin, &destination);
        let route = Route {
            id: new_id(),
            origin,
            destination,
            destination_name,
            distance_km,
            estimated_minutes: geo::estimated_minutes(distance_km),
            created_at: Utc::now(),
        };

        let persisted = {
            let mut state = self.state.lock().unwrap();
            state.routes.push(route.clone());
            self.persist_routes(&state)
        };
        Applied {
            value: route,
            persisted,
        }
    }

    /// Routes from the current location to the `limit` closest markers,
    /// ranked by great-circle distance.
    pub fn calculate_nearby_routes(
        &self,
        limit: usize,
    ) -> Result<Vec<Applied<Route>>, ServiceError> {
        let (origin, mut candidates) = {
            let state = self.state.lock().unwrap();
            let origin = state
                .current_location
                .as_ref()
                .map(|sample| sample.coordinate)
                .ok_or(ServiceError::LocationUnavailable)?;
            let candidates: Vec<(f64, String, Coordinate)> = state
                .markers
                .iter()
                .map(|marker| {
                    (
                        geo::distance_km(&origin, &marker.coordinate),
                        marker.name.clone(),
                        marker.coordinate,
                    )
                })
                .collect();
            (origin, candidates)
        };

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(candidates
            .into_iter()
            .take(limit)
            .map(|(_, name, coordinate)| self.calculate_route(origin, coordinate, Some(name)))
            .collect())
    }

    /// Free-text place search, centered on the current location when one
    /// is known. Hits can be turned into markers via
    /// `LocationRequest::Position`.
    pub async fn search_places(&self, query: &str, radius_m: u32) -> Vec<PlaceHit> {
        let near = self
            .state
            .lock()
            .unwrap()
            .current_location
            .as_ref()
            .map(|sample| sample.coordinate);
        self.geocoder.search_places(query, near, radius_m).await
    }

    /// Empty everything, memory and durable storage. The three in-memory
    /// resets happen under one lock, so no reader can observe a
    /// partially-cleared state.
    pub fn clear_all_data(&self) -> Applied<()> {
        let mut state = self.state.lock().unwrap();
        state.markers.clear();
        state.routes.clear();
        state.location_history.clear();
        let persisted = match self.store.clear(&[Collection::Markers, Collection::Routes]) {
            Ok(()) => true,
            Err(error) => {
                warn!("[service] failed to clear durable collections: {}", error);
                false
            }
        };
        Applied {
            value: (),
            persisted,
        }
    }

    pub fn current_location(&self) -> Option<LocationSample> {
        self.state.lock().unwrap().current_location.clone()
    }

    pub fn is_tracking(&self) -> bool {
        self.state.lock().unwrap().is_tracking
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.state.lock().unwrap().markers.clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.state.lock().unwrap().routes.clone()
    }

    pub fn location_history(&self) -> Vec<LocationSample> {
        self.state.lock().unwrap().location_history.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.lock().unwrap().error_message.clone()
    }

    pub fn usage_stats(&self) -> UsageStats {
        let state = self.state.lock().unwrap();
        stats::usage_stats(&state.markers, &state.routes)
    }

    pub fn history_summary(&self) -> Option<HistorySummary> {
        let state = self.state.lock().unwrap();
        stats::history_summary(&state.location_history)
    }

    /// Serialize everything into a versioned export bundle.
    pub fn export_json(&self) -> Result<String, ServiceError> {
        let bundle = {
            let state = self.state.lock().unwrap();
            ExportBundle::new(
                state.markers.clone(),
                state.routes.clone(),
                state.location_history.clone(),
            )
        };
        bundle
            .to_json()
            .map_err(|error| ServiceError::Persistence(error.to_string()))
    }

    fn persist_markers(&self, state: &ServiceState) -> bool {
        match self
            .store
            .save_collection(Collection::Markers, &state.markers)
        {
            Ok(()) => true,
            Err(error) => {
                warn!("[service] failed to persist markers: {}", error);
                false
            }
        }
    }

    fn persist_routes(&self, state: &ServiceState) -> bool {
        match self.store.save_collection(Collection::Routes, &state.routes) {
            Ok(()) => true,
            Err(error) => {
                warn!("[service] failed to persist routes: {}", error);
                false
            }
        }
    }

    fn set_error(&self, message: &str) {
        self.state.lock().unwrap().error_message = Some(message.to_string());
    }
}
