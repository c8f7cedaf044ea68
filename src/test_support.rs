//! Fixtures shared by unit tests

use std::collections::HashMap;

use crate::geolocation::{GeoError, GeoResolver};
use crate::models::{AccessEvent, GeoPoint};

pub const TEST_USER: &str = "bob";
pub const CURRENT_IP: &str = "42.222.21.19";
/// 5858 miles from the current location
pub const PRECEDING_IP: &str = "73.11.21.110";
/// 324 miles from the current location
pub const SUBSEQUENT_IP: &str = "27.202.31.1";
/// Parses, but has no database entry
pub const UNKNOWN_IP: &str = "10.0.0.1";
pub const CURRENT_TIMESTAMP: i64 = 1514764800;

pub const CURRENT_GEO: GeoPoint = GeoPoint {
    latitude: 34.7725,
    longitude: 113.7266,
    radius: 50,
};
pub const PRECEDING_GEO: GeoPoint = GeoPoint {
    latitude: 45.4998,
    longitude: -122.9586,
    radius: 5,
};
pub const SUBSEQUENT_GEO: GeoPoint = GeoPoint {
    latitude: 37.4627,
    longitude: 118.4917,
    radius: 1,
};

/// Resolver backed by a fixed table of addresses
pub struct StaticResolver {
    points: HashMap<String, GeoPoint>,
}

impl StaticResolver {
    pub fn fixtures() -> Self {
        let points = [
            (CURRENT_IP, CURRENT_GEO),
            (PRECEDING_IP, PRECEDING_GEO),
            (SUBSEQUENT_IP, SUBSEQUENT_GEO),
        ]
        .into_iter()
        .map(|(ip, point)| (ip.to_string(), point))
        .collect();

        StaticResolver { points }
    }
}

impl GeoResolver for StaticResolver {
    fn resolve(&self, ip: &str) -> Result<GeoPoint, GeoError> {
        if ip.parse::<std::net::IpAddr>().is_err() {
            return Err(GeoError::InvalidAddress(ip.to_string()));
        }
        self.points.get(ip).copied().ok_or(GeoError::NotFound)
    }
}

pub fn event(id: &str, timestamp: i64, ip: &str) -> AccessEvent {
    AccessEvent::new(id, TEST_USER, timestamp, ip).unwrap()
}

pub fn current_event() -> AccessEvent {
    event("current", CURRENT_TIMESTAMP, CURRENT_IP)
}
