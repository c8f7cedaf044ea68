//! IP geolocation using the MaxMind GeoLite2-City database
//!
//! The analysis engine only sees the [`GeoResolver`] trait. [`GeoIpService`]
//! is the production implementation; users must download the database file
//! separately from MaxMind (free with registration).

use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::models::GeoPoint;

/// Errors that can occur during geolocation lookups
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("invalid IP address format: {0}")]
    InvalidAddress(String),

    #[error("Failed to read database: {0}")]
    Database(#[from] MaxMindDBError),

    #[error("IP address not found in database")]
    NotFound,

    #[error("Location data missing for IP address")]
    NoLocation,

    #[error("Database file not found: {0}")]
    FileNotFound(String),
}

/// Maps an IP address string to a geographic point
pub trait GeoResolver: Send + Sync {
    /// Resolve `ip` to coordinates and an accuracy radius
    ///
    /// Fails with [`GeoError::InvalidAddress`] when `ip` is not an IPv4/IPv6
    /// literal, and with a lookup error when the database has no usable entry.
    fn resolve(&self, ip: &str) -> Result<GeoPoint, GeoError>;
}

impl<T: GeoResolver + ?Sized> GeoResolver for Arc<T> {
    fn resolve(&self, ip: &str) -> Result<GeoPoint, GeoError> {
        (**self).resolve(ip)
    }
}

fn parse_ip(ip: &str) -> Result<IpAddr, GeoError> {
    ip.parse().map_err(|_| GeoError::InvalidAddress(ip.to_string()))
}

/// GeoIP lookup service using MaxMind GeoLite2-City database
///
/// # Example
///
/// ```ignore
/// use geovelocity::geolocation::{GeoIpService, GeoResolver};
///
/// let service = GeoIpService::new("GeoLite2-City.mmdb")?;
/// let point = service.resolve("8.8.8.8")?;
/// println!("Location: {}, {} (±{} km)", point.latitude, point.longitude, point.radius);
/// ```
#[derive(Clone)]
pub struct GeoIpService {
    reader: Arc<Reader<Vec<u8>>>,
}

impl GeoIpService {
    /// Create a new GeoIP service from a MaxMind database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened or is invalid.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, GeoError> {
        let path = db_path.as_ref();
        if !path.exists() {
            return Err(GeoError::FileNotFound(path.display().to_string()));
        }

        let reader = Reader::open_readfile(path)?;
        log::debug!(
            "Opened GeoIP database {} ({})",
            path.display(),
            reader.metadata.database_type
        );
        Ok(GeoIpService {
            reader: Arc::new(reader),
        })
    }

    fn city(&self, ip: IpAddr) -> Result<geoip2::City<'_>, GeoError> {
        self.reader.lookup(ip).map_err(|e| match e {
            MaxMindDBError::AddressNotFoundError(_) => GeoError::NotFound,
            other => GeoError::Database(other),
        })
    }

    /// Get additional city information for an IP address
    ///
    /// Returns the full city record including country, city name, etc.
    pub fn lookup_city_info(&self, ip: &str) -> Result<CityInfo, GeoError> {
        let city = self.city(parse_ip(ip)?)?;
        let location = city.location.ok_or(GeoError::NoLocation)?;

        Ok(CityInfo {
            city_name: city
                .city
                .and_then(|c| c.names)
                .and_then(|n| n.get("en").copied())
                .map(String::from),
            country_name: city
                .country
                .as_ref()
                .and_then(|c| c.names.as_ref())
                .and_then(|n| n.get("en").copied())
                .map(String::from),
            country_code: city.country.and_then(|c| c.iso_code).map(String::from),
            timezone: location.time_zone.map(String::from),
        })
    }
}

impl GeoResolver for GeoIpService {
    fn resolve(&self, ip: &str) -> Result<GeoPoint, GeoError> {
        let city = self.city(parse_ip(ip)?)?;

        let location = city.location.ok_or(GeoError::NoLocation)?;
        let latitude = location.latitude.ok_or(GeoError::NoLocation)?;
        let longitude = location.longitude.ok_or(GeoError::NoLocation)?;

        Ok(GeoPoint {
            latitude,
            longitude,
            radius: location.accuracy_radius.unwrap_or(0),
        })
    }
}

/// Extended city information from the GeoIP database
#[derive(Debug, Clone, Default)]
pub struct CityInfo {
    /// City name in English
    pub city_name: Option<String>,
    /// Country name in English
    pub country_name: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: Option<String>,
    /// Timezone identifier (e.g., "America/New_York")
    pub timezone: Option<String>,
}

impl CityInfo {
    /// Get a human-readable location string
    pub fn display_location(&self) -> String {
        match (&self.city_name, &self.country_name) {
            (Some(city), Some(country)) => format!("{}, {}", city, country),
            (None, Some(country)) => country.clone(),
            (Some(city), None) => city.clone(),
            (None, None) => "unknown location".to_string(),
        }
    }
}
