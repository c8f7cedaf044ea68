use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use crate::persistence::SqliteEventStore;

/// Configuration for the geovelocity daemon
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// GeoIP database configuration
    pub geoip: GeoIpConfig,
    /// Event storage configuration
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

/// GeoIP database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// Path to the GeoLite2-City.mmdb database file
    pub database_path: PathBuf,
}

/// Event storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database file
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        GeoIpConfig {
            database_path: PathBuf::from("GeoLite2-City.mmdb"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("local-db"),
        }
    }
}

/// Values given on the command line or through the environment
///
/// Every field that is set replaces the corresponding configuration value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub geoip_database: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise start from the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(path) = overrides.geoip_database {
            self.geoip.database_path = path;
        }
        if let Some(dir) = overrides.data_dir {
            self.storage.data_dir = dir;
        }
        self
    }

    /// Resolve the configured host (IP literal or hostname) and port
    pub fn bind_addresses(&self) -> std::io::Result<Vec<SocketAddr>> {
        let addresses: Vec<SocketAddr> = (self.server.host.as_str(), self.server.port)
            .to_socket_addrs()?
            .collect();
        if addresses.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no address found for host {}", self.server.host),
            ));
        }
        Ok(addresses)
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        SqliteEventStore::database_path(&self.storage.data_dir)
    }
}
