//! Persistence of access events
//!
//! The analysis engine stores every event it sees and queries the store for
//! the temporal neighbors of the event under analysis.

pub mod sqlite_store;

pub use sqlite_store::SqliteEventStore;

use crate::models::AccessEvent;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data in database: {0}")]
    InvalidData(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Trait for access event storage backends
///
/// Implementations must make `upsert` atomic with respect to the event
/// identifier so that concurrent submissions of the same event store it once.
pub trait EventStore: Send + Sync {
    /// Store an event unless one with the same identifier already exists
    ///
    /// The first write wins; a duplicate never replaces the stored original.
    fn upsert(&self, event: &AccessEvent) -> Result<(), PersistenceError>;

    /// Most recent event for `username` at or before `timestamp`, other than `exclude_id`
    fn find_preceding(
        &self,
        username: &str,
        timestamp: i64,
        exclude_id: &str,
    ) -> Result<Option<AccessEvent>, PersistenceError>;

    /// Earliest event for `username` at or after `timestamp`, other than `exclude_id`
    fn find_subsequent(
        &self,
        username: &str,
        timestamp: i64,
        exclude_id: &str,
    ) -> Result<Option<AccessEvent>, PersistenceError>;

    /// Fetch a stored event by identifier
    fn get(&self, event_id: &str) -> Result<Option<AccessEvent>, PersistenceError>;

    /// Number of stored events for a user
    fn count_for_user(&self, username: &str) -> Result<usize, PersistenceError>;
}

impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    fn upsert(&self, event: &AccessEvent) -> Result<(), PersistenceError> {
        (**self).upsert(event)
    }

    fn find_preceding(
        &self,
        username: &str,
        timestamp: i64,
        exclude_id: &str,
    ) -> Result<Option<AccessEvent>, PersistenceError> {
        (**self).find_preceding(username, timestamp, exclude_id)
    }

    fn find_subsequent(
        &self,
        username: &str,
        timestamp: i64,
        exclude_id: &str,
    ) -> Result<Option<AccessEvent>, PersistenceError> {
        (**self).find_subsequent(username, timestamp, exclude_id)
    }

    fn get(&self, event_id: &str) -> Result<Option<AccessEvent>, PersistenceError> {
        (**self).get(event_id)
    }

    fn count_for_user(&self, username: &str) -> Result<usize, PersistenceError> {
        (**self).count_for_user(username)
    }
}
