use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::LocationSample;
use crate::marker::Marker;
use crate::route::Route;

pub const BUNDLE_VERSION: &str = "1.0.0";

/// Everything the app knows, as one shareable json document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub markers: Vec<Marker>,
    pub routes: Vec<Route>,
    pub location_history: Vec<LocationSample>,
}

impl ExportBundle {
    pub fn new(
        markers: Vec<Marker>,
        routes: Vec<Route>,
        location_history: Vec<LocationSample>,
    ) -> Self {
        ExportBundle {
            version: BUNDLE_VERSION.to_string(),
            exported_at: Utc::now(),
            markers,
            routes,
            location_history,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<ExportBundle> {
        Ok(serde_json::from_str(json)?)
    }
}
