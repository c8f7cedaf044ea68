//! Impossible travel analysis
//!
//! For an incoming access event the engine stores it, locates it, and compares
//! it with the same user's immediately preceding and subsequent events. Each
//! call is self-contained: nothing is cached between calls and no locking is
//! done beyond what the event store provides.

use thiserror::Error;

use super::distance::miles_between;
use super::velocity::{speed_mph, time_delta};
use crate::geolocation::{GeoError, GeoResolver};
use crate::models::{AccessEvent, AccessPoint, Verdict};
use crate::persistence::{EventStore, PersistenceError};

/// Errors that abort an analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Geolocation failed: {0}")]
    Geo(#[from] GeoError),

    #[error("Event store failed: {0}")]
    Store(#[from] PersistenceError),
}

/// Correlates access events for a user and scores the implied travel speed
pub struct AnalysisEngine<G, S> {
    resolver: G,
    store: S,
}

impl<G: GeoResolver, S: EventStore> AnalysisEngine<G, S> {
    pub fn new(resolver: G, store: S) -> Self {
        AnalysisEngine { resolver, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store `event` and judge travel to it from the preceding event and from
    /// it to the subsequent event.
    ///
    /// A missing neighbor is not an error and leaves its side of the verdict
    /// empty and unsuspicious. A neighbor that exists but cannot be located
    /// fails the whole call.
    pub fn analyze(&self, event: &AccessEvent) -> Result<Verdict, AnalysisError> {
        self.store.upsert(event)?;

        let current_geo = self.resolver.resolve(&event.ip_address)?;
        let current = AccessPoint {
            geo: Some(current_geo),
            ..event.as_access_point()
        };
        let mut verdict = Verdict::new(current_geo);

        let preceding = self.store.find_preceding(
            &event.username,
            event.unix_timestamp,
            &event.event_uuid,
        )?;
        if let Some(preceding) = preceding {
            verdict.set_preceding(Some(self.compare(&current, &preceding)?));
        }

        let subsequent = self.store.find_subsequent(
            &event.username,
            event.unix_timestamp,
            &event.event_uuid,
        )?;
        if let Some(subsequent) = subsequent {
            verdict.set_subsequent(Some(self.compare(&current, &subsequent)?));
        }

        Ok(verdict)
    }

    /// Locate a neighbor and attach the speed of travel between it and `current`
    fn compare(
        &self,
        current: &AccessPoint,
        neighbor: &AccessEvent,
    ) -> Result<AccessPoint, GeoError> {
        let mut neighbor = AccessPoint {
            geo: Some(self.resolver.resolve(&neighbor.ip_address)?),
            ..neighbor.as_access_point()
        };
        neighbor.speed = implied_speed(current, &neighbor);
        Ok(neighbor)
    }
}

/// Speed in miles per hour needed to travel between two access points
///
/// An access point without a location contributes a distance of zero.
pub fn implied_speed(current: &AccessPoint, other: &AccessPoint) -> i64 {
    let distance = match (&current.geo, &other.geo) {
        (Some(from), to) => miles_between(from, to.as_ref()),
        (None, _) => 0.0,
    };
    speed_mph(distance, time_delta(current.timestamp, other.timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SqliteEventStore;
    use crate::test_support::*;

    /// Store that hands back fixed neighbors
    #[derive(Default)]
    struct FixedStore {
        preceding: Option<AccessEvent>,
        subsequent: Option<AccessEvent>,
        fail_upsert: bool,
        fail_lookup: bool,
    }

    impl FixedStore {
        fn lookup(
            &self,
            found: &Option<AccessEvent>,
        ) -> Result<Option<AccessEvent>, PersistenceError> {
            if self.fail_lookup {
                return Err(PersistenceError::InvalidData("lookup failed".to_string()));
            }
            Ok(found.clone())
        }
    }

    impl EventStore for FixedStore {
        fn upsert(&self, _event: &AccessEvent) -> Result<(), PersistenceError> {
            if self.fail_upsert {
                return Err(PersistenceError::InvalidData("upsert failed".to_string()));
            }
            Ok(())
        }

        fn find_preceding(
            &self,
            _: &str,
            _: i64,
            _: &str,
        ) -> Result<Option<AccessEvent>, PersistenceError> {
            self.lookup(&self.preceding)
        }

        fn find_subsequent(
            &self,
            _: &str,
            _: i64,
            _: &str,
        ) -> Result<Option<AccessEvent>, PersistenceError> {
            self.lookup(&self.subsequent)
        }

        fn get(&self, _: &str) -> Result<Option<AccessEvent>, PersistenceError> {
            Ok(None)
        }

        fn count_for_user(&self, _: &str) -> Result<usize, PersistenceError> {
            Ok(0)
        }
    }

    fn engine(store: FixedStore) -> AnalysisEngine<StaticResolver, FixedStore> {
        AnalysisEngine::new(StaticResolver::fixtures(), store)
    }

    fn plausible_preceding() -> AccessEvent {
        // 5858 miles in 12 hours
        event("preceding", CURRENT_TIMESTAMP - 12 * 3600, PRECEDING_IP)
    }

    fn plausible_subsequent() -> AccessEvent {
        // 324 miles in 1 hour
        event("subsequent", CURRENT_TIMESTAMP + 3600, SUBSEQUENT_IP)
    }

    #[test]
    fn test_plausible_neighbors() {
        let verdict = engine(FixedStore {
            preceding: Some(plausible_preceding()),
            subsequent: Some(plausible_subsequent()),
            ..Default::default()
        })
        .analyze(&current_event())
        .unwrap();

        assert_eq!(*verdict.current_geo(), CURRENT_GEO);
        assert!(!verdict.travel_to_suspicious());
        assert!(!verdict.travel_from_suspicious());

        let preceding = verdict.preceding().unwrap();
        assert_eq!(preceding.speed, 488);
        assert_eq!(preceding.geo, Some(PRECEDING_GEO));
        assert_eq!(preceding.ip, PRECEDING_IP);
        assert_eq!(preceding.timestamp, CURRENT_TIMESTAMP - 12 * 3600);

        let subsequent = verdict.subsequent().unwrap();
        assert_eq!(subsequent.speed, 324);
        assert_eq!(subsequent.geo, Some(SUBSEQUENT_GEO));
    }

    #[test]
    fn test_suspicious_preceding() {
        let verdict = engine(FixedStore {
            preceding: Some(event("preceding", CURRENT_TIMESTAMP - 20000, PRECEDING_IP)),
            subsequent: Some(plausible_subsequent()),
            ..Default::default()
        })
        .analyze(&current_event())
        .unwrap();

        assert_eq!(verdict.preceding().unwrap().speed, 1054);
        assert!(verdict.travel_to_suspicious());
        assert!(!verdict.travel_from_suspicious());
    }

    #[test]
    fn test_suspicious_subsequent() {
        let verdict = engine(FixedStore {
            preceding: Some(plausible_preceding()),
            subsequent: Some(event("subsequent", CURRENT_TIMESTAMP + 600, SUBSEQUENT_IP)),
            ..Default::default()
        })
        .analyze(&current_event())
        .unwrap();

        assert_eq!(verdict.subsequent().unwrap().speed, 1944);
        assert!(!verdict.travel_to_suspicious());
        assert!(verdict.travel_from_suspicious());
    }

    #[test]
    fn test_just_under_threshold() {
        let verdict = engine(FixedStore {
            preceding: Some(event(
                "preceding",
                CURRENT_TIMESTAMP - (324 * 3600 / 500 + 100),
                SUBSEQUENT_IP,
            )),
            ..Default::default()
        })
        .analyze(&current_event())
        .unwrap();

        assert!(verdict.preceding().unwrap().speed < 500);
        assert!(!verdict.travel_to_suspicious());
    }

    #[test]
    fn test_same_timestamp_is_suspicious() {
        let verdict = engine(FixedStore {
            preceding: Some(event("twin-before", CURRENT_TIMESTAMP, CURRENT_IP)),
            subsequent: Some(event("twin-after", CURRENT_TIMESTAMP, SUBSEQUENT_IP)),
            ..Default::default()
        })
        .analyze(&current_event())
        .unwrap();

        assert_eq!(verdict.preceding().unwrap().speed, i64::MAX);
        assert_eq!(verdict.subsequent().unwrap().speed, i64::MAX);
        assert!(verdict.travel_to_suspicious());
        assert!(verdict.travel_from_suspicious());
    }

    #[test]
    fn test_no_preceding_event() {
        let verdict = engine(FixedStore {
            subsequent: Some(event("subsequent", CURRENT_TIMESTAMP + 1, SUBSEQUENT_IP)),
            ..Default::default()
        })
        .analyze(&current_event())
        .unwrap();

        assert!(verdict.preceding().is_none());
        assert!(!verdict.travel_to_suspicious());
        assert!(verdict.travel_from_suspicious());
    }

    #[test]
    fn test_no_neighbors() {
        let verdict = engine(FixedStore::default()).analyze(&current_event()).unwrap();

        assert!(verdict.preceding().is_none());
        assert!(verdict.subsequent().is_none());
        assert!(!verdict.travel_to_suspicious());
        assert!(!verdict.travel_from_suspicious());
    }

    #[test]
    fn test_unresolvable_current_fails() {
        let result = engine(FixedStore::default())
            .analyze(&event("current", CURRENT_TIMESTAMP, UNKNOWN_IP));
        assert!(matches!(result, Err(AnalysisError::Geo(GeoError::NotFound))));
    }

    #[test]
    fn test_unresolvable_neighbor_fails() {
        let result = engine(FixedStore {
            preceding: Some(event("preceding", CURRENT_TIMESTAMP - 60, UNKNOWN_IP)),
            ..Default::default()
        })
        .analyze(&current_event());
        assert!(matches!(result, Err(AnalysisError::Geo(GeoError::NotFound))));
    }

    #[test]
    fn test_store_failures_abort() {
        let upsert = engine(FixedStore {
            fail_upsert: true,
            ..Default::default()
        })
        .analyze(&current_event());
        assert!(matches!(upsert, Err(AnalysisError::Store(_))));

        let lookup = engine(FixedStore {
            fail_lookup: true,
            ..Default::default()
        })
        .analyze(&current_event());
        assert!(matches!(lookup, Err(AnalysisError::Store(_))));
    }

    #[test]
    fn test_implied_speed_without_location() {
        let current = current_event().as_access_point();
        let other = event("other", CURRENT_TIMESTAMP - 3600, PRECEDING_IP).as_access_point();
        assert_eq!(implied_speed(&current, &other), 0);
    }

    #[test]
    fn test_with_sqlite_store() {
        let store = SqliteEventStore::in_memory().unwrap();
        let engine = AnalysisEngine::new(StaticResolver::fixtures(), store);

        engine
            .analyze(&event("preceding", CURRENT_TIMESTAMP - 20000, PRECEDING_IP))
            .unwrap();
        engine.analyze(&plausible_subsequent()).unwrap();

        let verdict = engine.analyze(&current_event()).unwrap();
        assert!(verdict.travel_to_suspicious());
        assert!(!verdict.travel_from_suspicious());
        assert_eq!(verdict.preceding().unwrap().ip, PRECEDING_IP);
        assert_eq!(verdict.subsequent().unwrap().ip, SUBSEQUENT_IP);

        // Resubmission does not duplicate the stored event
        let again = engine.analyze(&current_event()).unwrap();
        assert_eq!(again, verdict);
        assert_eq!(engine.store().count_for_user(TEST_USER).unwrap(), 3);
    }
}
