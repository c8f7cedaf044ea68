use serde::{Deserialize, Serialize};

use crate::detection::velocity::is_suspicious_speed;

/// Geographic coordinates resolved for an IP address
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Accuracy radius in kilometers
    pub radius: u16,
}

/// A neighbor access event with its location and the implied speed of
/// travel between it and the event under analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessPoint {
    #[serde(flatten)]
    pub geo: Option<GeoPoint>,
    pub ip: String,
    /// Miles per hour, `i64::MAX` for simultaneous events
    pub speed: i64,
    pub timestamp: i64,
}

/// Result of one impossible travel analysis
///
/// The suspicion flags are derived from the neighbor access points when they
/// are set and cannot be written independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    #[serde(rename = "currentGeo")]
    current_geo: GeoPoint,
    #[serde(rename = "travelToCurrentGeoSuspicious")]
    travel_to_suspicious: bool,
    #[serde(rename = "travelFromCurrentGeoSuspicious")]
    travel_from_suspicious: bool,
    #[serde(rename = "precedingIpAccess", skip_serializing_if = "Option::is_none")]
    preceding: Option<AccessPoint>,
    #[serde(rename = "subsequentIpAccess", skip_serializing_if = "Option::is_none")]
    subsequent: Option<AccessPoint>,
}

impl Verdict {
    pub fn new(current_geo: GeoPoint) -> Self {
        Verdict {
            current_geo,
            travel_to_suspicious: false,
            travel_from_suspicious: false,
            preceding: None,
            subsequent: None,
        }
    }

    pub fn set_preceding(&mut self, access: Option<AccessPoint>) {
        self.travel_to_suspicious = access
            .as_ref()
            .is_some_and(|a| is_suspicious_speed(a.speed));
        self.preceding = access;
    }

    pub fn set_subsequent(&mut self, access: Option<AccessPoint>) {
        self.travel_from_suspicious = access
            .as_ref()
            .is_some_and(|a| is_suspicious_speed(a.speed));
        self.subsequent = access;
    }

    pub fn with_preceding(mut self, access: Option<AccessPoint>) -> Self {
        self.set_preceding(access);
        self
    }

    pub fn with_subsequent(mut self, access: Option<AccessPoint>) -> Self {
        self.set_subsequent(access);
        self
    }

    pub fn current_geo(&self) -> &GeoPoint {
        &self.current_geo
    }

    /// Travel from the preceding event to the current one was implausibly fast
    pub fn travel_to_suspicious(&self) -> bool {
        self.travel_to_suspicious
    }

    /// Travel from the current event to the subsequent one was implausibly fast
    pub fn travel_from_suspicious(&self) -> bool {
        self.travel_from_suspicious
    }

    pub fn preceding(&self) -> Option<&AccessPoint> {
        self.preceding.as_ref()
    }

    pub fn subsequent(&self) -> Option<&AccessPoint> {
        self.subsequent.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo() -> GeoPoint {
        GeoPoint { latitude: 34.7725, longitude: 113.7266, radius: 50 }
    }

    fn access(speed: i64) -> AccessPoint {
        AccessPoint {
            geo: Some(GeoPoint { latitude: 45.4998, longitude: -122.9586, radius: 5 }),
            ip: "73.11.21.110".to_string(),
            speed,
            timestamp: 1514744800,
        }
    }

    #[test]
    fn test_flags_follow_threshold() {
        let verdict = Verdict::new(geo())
            .with_preceding(Some(access(500)))
            .with_subsequent(Some(access(499)));
        assert!(verdict.travel_to_suspicious());
        assert!(!verdict.travel_from_suspicious());
    }

    #[test]
    fn test_absent_neighbors_are_not_suspicious() {
        let verdict = Verdict::new(geo()).with_preceding(None).with_subsequent(None);
        assert!(!verdict.travel_to_suspicious());
        assert!(!verdict.travel_from_suspicious());
        assert!(verdict.preceding().is_none());
        assert!(verdict.subsequent().is_none());
    }

    #[test]
    fn test_resetting_neighbor_clears_flag() {
        let mut verdict = Verdict::new(geo());
        verdict.set_preceding(Some(access(i64::MAX)));
        assert!(verdict.travel_to_suspicious());
        verdict.set_preceding(None);
        assert!(!verdict.travel_to_suspicious());
    }

    #[test]
    fn test_serialized_shape() {
        let verdict = Verdict::new(geo()).with_preceding(Some(access(1054)));
        let json = serde_json::to_value(&verdict).unwrap();

        assert_eq!(json["currentGeo"]["lat"], 34.7725);
        assert_eq!(json["currentGeo"]["lon"], 113.7266);
        assert_eq!(json["currentGeo"]["radius"], 50);
        assert_eq!(json["travelToCurrentGeoSuspicious"], true);
        assert_eq!(json["travelFromCurrentGeoSuspicious"], false);
        assert_eq!(json["precedingIpAccess"]["ip"], "73.11.21.110");
        assert_eq!(json["precedingIpAccess"]["speed"], 1054);
        assert_eq!(json["precedingIpAccess"]["timestamp"], 1514744800);
        assert_eq!(json["precedingIpAccess"]["lat"], 45.4998);
        assert_eq!(json["precedingIpAccess"]["radius"], 5);
        assert!(json.get("subsequentIpAccess").is_none());
    }

    #[test]
    fn test_infinite_speed_serializes_exactly() {
        let verdict = Verdict::new(geo()).with_subsequent(Some(access(i64::MAX)));
        let json = serde_json::to_string(&verdict).unwrap();
        assert!(json.contains(&format!("\"speed\":{}", i64::MAX)));
    }
}
