#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use waypoint_core::geo::{Coordinate, LocationSample};
use waypoint_core::geocoder::{DeviceGeocoder, GeocoderConfig, GeocodingGateway};
use waypoint_core::location_provider::{
    Accuracy, LocationProvider, LocationSubscription, PermissionStatus, ProviderError, WatchOptions,
};

pub fn sample(latitude: f64, longitude: f64) -> LocationSample {
    LocationSample {
        coordinate: Coordinate::new(latitude, longitude),
        timestamp: Utc::now(),
    }
}

/// Base url pointing at a port nothing listens on, so the primary
/// geocoding tier fails fast without touching the network.
pub fn dead_primary_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub struct FakeDeviceGeocoder {
    pub results: Vec<Coordinate>,
}

#[async_trait]
impl DeviceGeocoder for FakeDeviceGeocoder {
    async fn geocode(&self, _address: &str) -> anyhow::Result<Vec<Coordinate>> {
        Ok(self.results.clone())
    }
}

/// Gateway whose primary tier always fails, leaving only the injected
/// device results.
pub fn offline_gateway(device_results: Vec<Coordinate>) -> GeocodingGateway {
    let mut config = GeocoderConfig::new("test-key");
    config.base_url = dead_primary_base_url();
    GeocodingGateway::new(
        config,
        Box::new(FakeDeviceGeocoder {
            results: device_results,
        }),
    )
    .unwrap()
}

/// Scripted platform location stack. Tests push watch samples through
/// `push_sample` the way the platform would.
pub struct FakeProvider {
    pub permission: PermissionStatus,
    pub fix: Mutex<Option<LocationSample>>,
    pub watch_calls: AtomicUsize,
    pub cancel_calls: Arc<AtomicUsize>,
    sink: Arc<Mutex<Option<mpsc::Sender<LocationSample>>>>,
}

impl FakeProvider {
    pub fn new(permission: PermissionStatus, fix: Option<LocationSample>) -> Arc<FakeProvider> {
        Arc::new(FakeProvider {
            permission,
            fix: Mutex::new(fix),
            watch_calls: AtomicUsize::new(0),
            cancel_calls: Arc::new(AtomicUsize::new(0)),
            sink: Arc::new(Mutex::new(None)),
        })
    }

    pub async fn push_sample(&self, sample: LocationSample) {
        let sink = self.sink.lock().unwrap().clone();
        if let Some(sink) = sink {
            let _ = sink.send(sample).await;
        }
    }

    pub fn has_live_watch(&self) -> bool {
        self.sink.lock().unwrap().is_some()
    }
}

struct FakeSubscription {
    cancel_calls: Arc<AtomicUsize>,
    sink: Arc<Mutex<Option<mpsc::Sender<LocationSample>>>>,
}

impl LocationSubscription for FakeSubscription {
    fn cancel(self: Box<Self>) {
        self.sink.lock().unwrap().take();
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocationProvider for FakeProvider {
    async fn request_permission(&self) -> Result<PermissionStatus, ProviderError> {
        Ok(self.permission)
    }

    async fn current_fix(&self, _accuracy: Accuracy) -> Result<LocationSample, ProviderError> {
        match self.fix.lock().unwrap().clone() {
            Some(sample) => Ok(sample),
            None => Err(ProviderError::Unavailable("no fix".to_string())),
        }
    }

    async fn watch(
        &self,
        _options: WatchOptions,
        sink: mpsc::Sender<LocationSample>,
    ) -> Result<Box<dyn LocationSubscription>, ProviderError> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        *self.sink.lock().unwrap() = Some(sink);
        Ok(Box::new(FakeSubscription {
            cancel_calls: Arc::clone(&self.cancel_calls),
            sink: Arc::clone(&self.sink),
        }))
    }
}

/// Poll until `predicate` holds; panics after ~1s. Watch samples cross a
/// channel and a forwarder task, so state updates are not immediate.
pub async fn eventually(mut predicate: impl FnMut() -> bool) {
    for _ in 0..100 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
