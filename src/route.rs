use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A straight-line origin→destination estimate, not a navigable path.
/// `distance_km` keeps full precision; display rounds to one decimal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Name of the destination marker, when the route targets one.
    pub destination_name: Option<String>,
    pub distance_km: f64,
    pub estimated_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn display_distance(&self) -> String {
        format!("{:.1}", self.distance_km)
    }
}
