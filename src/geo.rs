use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    // Range check only; `distance_km` itself accepts any finite pair and
    // callers decide where validation happens.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

fn to_rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Great-circle distance between two points via the haversine formula.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = to_rad(b.latitude - a.latitude);
    let d_lon = to_rad(b.longitude - a.longitude);
    let lat_a = to_rad(a.latitude);
    let lat_b = to_rad(b.latitude);

    let h = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat_a.cos() * lat_b.cos();
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

// 2 minutes per km. A placeholder heuristic, not a travel-time model; the
// formula is part of the behavioral contract and must not be "improved".
pub fn estimated_minutes(distance_km: f64) -> u32 {
    (distance_km * 2.0).round() as u32
}

/// A known device position. Ephemeral: the current location and the
/// location history are rebuilt every session, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
}
