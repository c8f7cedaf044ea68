//! Great-circle distance between resolved locations

use crate::models::GeoPoint;

const EARTH_RADIUS_MILES: f64 = 3958.0;

/// Calculate the great-circle distance between two points using the Haversine formula
/// Returns distance in miles
pub fn haversine_miles(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

/// Distance to a neighbor that may not have been located; unknown counts as 0
pub fn miles_between(from: &GeoPoint, to: Option<&GeoPoint>) -> f64 {
    to.map_or(0.0, |to| haversine_miles(from, to))
}
