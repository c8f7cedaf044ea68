pub mod api;
pub mod config;
pub mod detection;
pub mod geolocation;
pub mod models;
pub mod persistence;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use models::{AccessEvent, AccessPoint, GeoPoint, Verdict};
pub use detection::{AnalysisEngine, AnalysisError, SUSPICIOUS_SPEED_MPH};
pub use geolocation::{GeoError, GeoIpService, GeoResolver};
pub use persistence::{EventStore, PersistenceError, SqliteEventStore};
