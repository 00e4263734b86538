use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ServiceError;
use crate::geo::Coordinate;
use crate::marker::Category;

/* Two-tier address resolution. The primary tier is the hosted geocoding
API over http; the secondary tier is whatever on-device geocoder the
platform embedding injects. First tier to produce a result wins. Results
are never cached, every call re-resolves, and there are no retries beyond
the fallback itself. */

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_PLACE_HITS: usize = 5;
const MAX_FALLBACK_HITS: usize = 3;

/// Example queries the UI shows next to a `GeocodeNotFound` failure.
pub const ADDRESS_EXAMPLES: [&str; 3] = [
    "São Paulo, SP",
    "Av. Paulista, São Paulo",
    "Cristo Redentor, Rio de Janeiro",
];

#[derive(Clone, Debug)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: String,
}

impl GeocoderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        GeocoderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }
}

/// The on-device geocoder supplied by the platform embedding. It has no
/// address formatter, so callers keep the query string for display.
#[async_trait]
pub trait DeviceGeocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Vec<Coordinate>>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAddress {
    pub coordinate: Coordinate,
    pub formatted_address: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaceHit {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    pub rating: Option<f32>,
    pub category: Category,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    formatted_address: String,
    geometry: Geometry,
    rating: Option<f32>,
    #[serde(default)]
    types: Vec<String>,
}

pub struct GeocodingGateway {
    http: reqwest::Client,
    config: GeocoderConfig,
    device: Box<dyn DeviceGeocoder>,
}

impl GeocodingGateway {
    pub fn new(config: GeocoderConfig, device: Box<dyn DeviceGeocoder>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(GeocodingGateway {
            http,
            config,
            device,
        })
    }

    /// Resolve a free-text address to coordinates plus a display address.
    pub async fn geocode(&self, address: &str) -> Result<ResolvedAddress, ServiceError> {
        let address = address.trim();
        if address.is_empty() {
            // don't burn provider quota on a blank query
            return Err(ServiceError::GeocodeNotFound {
                query: String::new(),
            });
        }

        match self.geocode_primary(address).await {
            Ok(resolved) => return Ok(resolved),
            Err(error) => {
                debug!("[geocoder] primary tier failed for {:?}: {}", address, error);
            }
        }

        match self.device.geocode(address).await {
            Ok(coordinates) => match coordinates.first() {
                Some(coordinate) => Ok(ResolvedAddress {
                    coordinate: *coordinate,
                    // the device tier has no formatter, echo the query
                    formatted_address: address.to_string(),
                }),
                None => Err(ServiceError::GeocodeNotFound {
                    query: address.to_string(),
                }),
            },
            Err(error) => {
                debug!("[geocoder] device tier failed for {:?}: {}", address, error);
                Err(ServiceError::GeocodeNotFound {
                    query: address.to_string(),
                })
            }
        }
    }

    async fn geocode_primary(&self, address: &str) -> Result<ResolvedAddress> {
        let url = format!("{}/maps/api/geocode/json", self.config.base_url);
        let response: GeocodeResponse = self
            .http
            .get(&url)
            .query(&[("address", address), ("key", self.config.api_key.as_str())])
            .send()
            .await?
            .json()
            .await?;

        if response.status == "REQUEST_DENIED" {
            // key/quota problem, not a miss; keep it loud in the log
            warn!("[geocoder] primary provider denied the request");
            bail!("request denied");
        }
        if response.status != "OK" || response.results.is_empty() {
            bail!(
                "status {} with {} results",
                response.status,
                response.results.len()
            );
        }

        let first = &response.results[0];
        Ok(ResolvedAddress {
            coordinate: Coordinate::new(first.geometry.location.lat, first.geometry.location.lng),
            formatted_address: first.formatted_address.clone(),
        })
    }

    /// Free-text place search near an optional location. Falls back to
    /// device geocoding, and "no results" is an empty vec, never an error.
    pub async fn search_places(
        &self,
        query: &str,
        near: Option<Coordinate>,
        radius_m: u32,
    ) -> Vec<PlaceHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.search_primary(query, near, radius_m).await {
            Ok(hits) if !hits.is_empty() => return hits,
            Ok(_) => debug!("[geocoder] place search empty for {:?}", query),
            Err(error) => debug!("[geocoder] place search failed for {:?}: {}", query, error),
        }

        match self.device.geocode(query).await {
            Ok(coordinates) => coordinates
                .into_iter()
                .take(MAX_FALLBACK_HITS)
                .enumerate()
                .map(|(i, coordinate)| PlaceHit {
                    id: format!("geo_{}", i),
                    name: query.to_string(),
                    address: format!("{:.4}, {:.4}", coordinate.latitude, coordinate.longitude),
                    coordinate,
                    rating: None,
                    category: Category::Other,
                })
                .collect(),
            Err(error) => {
                debug!("[geocoder] fallback search failed for {:?}: {}", query, error);
                Vec::new()
            }
        }
    }

    async fn search_primary(
        &self,
        query: &str,
        near: Option<Coordinate>,
        radius_m: u32,
    ) -> Result<Vec<PlaceHit>> {
        let url = format!("{}/maps/api/place/textsearch/json", self.config.base_url);
        let mut request = self
            .http
            .get(&url)
            .query(&[("query", query), ("key", self.config.api_key.as_str())]);
        if let Some(near) = near {
            let location = format!("{},{}", near.latitude, near.longitude);
            request = request.query(&[
                ("location", location.as_str()),
                ("radius", radius_m.to_string().as_str()),
            ]);
        }
        let response: PlacesResponse = request.send().await?.json().await?;

        if response.status != "OK" {
            bail!("status {}", response.status);
        }
        Ok(response
            .results
            .into_iter()
            .take(MAX_PLACE_HITS)
            .map(|place| PlaceHit {
                category: Category::from_place_types(&place.types),
                id: place.place_id,
                name: place.name,
                address: place.formatted_address,
                coordinate: Coordinate::new(
                    place.geometry.location.lat,
                    place.geometry.location.lng,
                ),
                rating: place.rating,
            })
            .collect())
    }
}
