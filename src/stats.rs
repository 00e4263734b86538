use std::collections::HashMap;

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::geo::LocationSample;
use crate::marker::{Category, Marker};
use crate::route::Route;

/* Pure aggregation over the in-memory collections, computed on demand
for the profile screen. */

const TOP_CATEGORY_COUNT: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct UsageStats {
    pub total_markers: usize,
    /// Up to three most-used categories, most frequent first.
    pub top_categories: Vec<Category>,
    pub total_route_km: f64,
    pub first_marker_at: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn display_total_route_km(&self) -> String {
        format!("{:.1}", self.total_route_km)
    }
}

pub fn usage_stats(markers: &[Marker], routes: &[Route]) -> UsageStats {
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for marker in markers {
        *counts.entry(marker.category).or_default() += 1;
    }
    let top_categories = counts
        .into_iter()
        // category order breaks count ties so the result is stable
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(TOP_CATEGORY_COUNT)
        .map(|(category, _)| category)
        .collect();

    UsageStats {
        total_markers: markers.len(),
        top_categories,
        total_route_km: routes.iter().map(|route| route.distance_km).sum(),
        first_marker_at: markers.iter().map(|marker| marker.created_at).min(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistorySummary {
    pub samples: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub span_hours: f64,
}

/// Summary of the tracked history, `None` when no samples exist.
pub fn history_summary(history: &[LocationSample]) -> Option<HistorySummary> {
    let first = history.first()?;
    let last = history.last()?;
    let span_hours =
        (last.timestamp - first.timestamp).num_milliseconds() as f64 / (1000.0 * 3600.0);
    Some(HistorySummary {
        samples: history.len(),
        first: first.timestamp,
        last: last.timestamp,
        span_hours,
    })
}
