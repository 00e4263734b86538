use crate::geo::Coordinate;
use crate::marker::Marker;
use crate::route::Route;

/* Share strings and maps deep links the UI hands to the platform share
sheet / URL opener. The native app link is tried first; the universal web
URL is the fallback when no maps app is installed. */

pub fn maps_place_url(coordinate: &Coordinate) -> String {
    format!(
        "https://maps.google.com/?q={},{}",
        coordinate.latitude, coordinate.longitude
    )
}

pub fn navigation_url_ios(destination: &Coordinate) -> String {
    format!(
        "maps://app?daddr={},{}",
        destination.latitude, destination.longitude
    )
}

pub fn navigation_url_android(destination: &Coordinate) -> String {
    format!(
        "google.navigation:q={},{}",
        destination.latitude, destination.longitude
    )
}

pub fn navigation_url_web(destination: &Coordinate) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}",
        destination.latitude, destination.longitude
    )
}

pub fn marker_share_message(marker: &Marker) -> String {
    format!(
        "📍 {}\n📍 {}\n🗺️ {}",
        marker.name,
        marker.address,
        maps_place_url(&marker.coordinate)
    )
}

pub fn route_share_message(route: &Route) -> String {
    let destination = route
        .destination_name
        .as_deref()
        .map(|name| name.to_string())
        .unwrap_or_else(|| {
            format!(
                "{:.4}, {:.4}",
                route.destination.latitude, route.destination.longitude
            )
        });
    format!(
        "🗺️ Route to {}\n📏 {} km\n⏱️ {} min\n{}",
        destination,
        route.display_distance(),
        route.estimated_minutes,
        navigation_url_web(&route.destination)
    )
}
