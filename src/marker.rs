use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::geo::Coordinate;

/// Address string used when a marker is created from the device position
/// instead of a geocoded address.
pub const CURRENT_LOCATION_ADDRESS: &str = "Current location";

/// Fixed marker categories. Icon and color are cosmetic but stable: they
/// are persisted through export bundles, so renaming a variant is a
/// breaking change.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Home,
    Work,
    Restaurant,
    Hospital,
    School,
    Shop,
    Gas,
    Park,
    Other,
}

impl Category {
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Home => "home",
            Category::Work => "briefcase",
            Category::Restaurant => "restaurant",
            Category::Hospital => "medical",
            Category::School => "school",
            Category::Shop => "storefront",
            Category::Gas => "car",
            Category::Park => "leaf",
            Category::Other => "location",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Home => "#34C759",
            Category::Work => "#007AFF",
            Category::Restaurant => "#FF9500",
            Category::Hospital => "#FF3B30",
            Category::School => "#5856D6",
            Category::Shop => "#FF2D92",
            Category::Gas => "#8E8E93",
            Category::Park => "#32D74B",
            Category::Other => "#007AFF",
        }
    }

    /// Best-effort mapping from place-type tags (as returned by the place
    /// search provider) to a category.
    pub fn from_place_types(types: &[String]) -> Category {
        let has = |tag: &str| types.iter().any(|t| t == tag);
        if has("restaurant") || has("food") {
            Category::Restaurant
        } else if has("hospital") || has("doctor") || has("pharmacy") {
            Category::Hospital
        } else if has("school") || has("university") {
            Category::School
        } else if has("store") || has("shopping_mall") {
            Category::Shop
        } else if has("gas_station") {
            Category::Gas
        } else if has("park") {
            Category::Park
        } else {
            Category::Other
        }
    }
}

/// A saved point of interest. Never mutated in place; an edit is modeled
/// as remove + add.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub coordinate: Coordinate,
    pub created_at: DateTime<Utc>,
}

/// Where a new marker gets its coordinates from.
#[derive(Clone, Debug, PartialEq)]
pub enum LocationRequest {
    /// Use the service's current location; fails when there is none.
    CurrentLocation,
    /// Geocode a free-text address through the two-tier gateway.
    Address(String),
    /// Explicit coordinates, e.g. a hit picked from place search.
    Position(Coordinate),
}

/// Marker input: everything but the id and creation timestamp, which the
/// service assigns.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerDraft {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub location: LocationRequest,
}
