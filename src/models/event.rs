use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::verdict::AccessPoint;

/// Raised when an access event carries an IP that is not an IPv4/IPv6 literal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid IP address format: {ip}")]
pub struct InvalidIp {
    pub ip: String,
}

/// One login attempt for a username from a source IP
///
/// The IP address is validated on construction and on deserialization, so an
/// `AccessEvent` that exists always carries a parseable address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAccessEvent")]
pub struct AccessEvent {
    pub event_uuid: String,
    pub username: String,
    pub unix_timestamp: i64,
    pub ip_address: String,
}

#[derive(Deserialize)]
struct RawAccessEvent {
    event_uuid: String,
    username: String,
    unix_timestamp: i64,
    ip_address: String,
}

impl TryFrom<RawAccessEvent> for AccessEvent {
    type Error = InvalidIp;

    fn try_from(raw: RawAccessEvent) -> Result<Self, Self::Error> {
        AccessEvent::new(raw.event_uuid, raw.username, raw.unix_timestamp, raw.ip_address)
    }
}

impl AccessEvent {
    pub fn new(
        event_uuid: impl Into<String>,
        username: impl Into<String>,
        unix_timestamp: i64,
        ip_address: impl Into<String>,
    ) -> Result<Self, InvalidIp> {
        let ip_address = ip_address.into();
        if ip_address.parse::<IpAddr>().is_err() {
            return Err(InvalidIp { ip: ip_address });
        }

        Ok(AccessEvent {
            event_uuid: event_uuid.into(),
            username: username.into(),
            unix_timestamp,
            ip_address,
        })
    }

    /// Project this event onto an access point with no location or speed yet
    pub fn as_access_point(&self) -> AccessPoint {
        AccessPoint {
            geo: None,
            ip: self.ip_address.clone(),
            speed: 0,
            timestamp: self.unix_timestamp,
        }
    }
}
