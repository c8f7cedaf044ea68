//! SQLite implementation of the EventStore trait

use super::{EventStore, PersistenceError};
use crate::models::AccessEvent;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// File name of the database inside a data directory
pub const DATABASE_FILE: &str = "local.db";

const EVENT_COLUMNS: &str = "event_uuid, username, unix_timestamp, ip_address";

/// SQLite-based access event storage
///
/// A single connection is shared behind a mutex, which serializes the
/// insert-if-absent and neighbor queries of concurrent analyses.
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    /// Open (or create) the database at the specified path
    ///
    /// Missing parent directories are created and the schema is initialized
    /// if it doesn't exist.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        log::debug!("Opening event store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Open the database file inside a data directory
    pub fn open_in_dir<P: AsRef<Path>>(data_dir: P) -> Result<Self, PersistenceError> {
        Self::open(Self::database_path(data_dir))
    }

    /// Path of the database file for a data directory
    pub fn database_path<P: AsRef<Path>>(data_dir: P) -> PathBuf {
        data_dir.as_ref().join(DATABASE_FILE)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        let store = SqliteEventStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        let conn = self.conn()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)
    }

    /// Columns as stored; the IP is validated again on the way out
    fn read_row(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn into_event(
        (event_uuid, username, unix_timestamp, ip_address): (String, String, i64, String),
    ) -> Result<AccessEvent, PersistenceError> {
        AccessEvent::new(event_uuid, username, unix_timestamp, ip_address)
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))
    }

    fn query_event(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<AccessEvent>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;

        match stmt.query_row(params, Self::read_row) {
            Ok(columns) => Ok(Some(Self::into_event(columns)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl EventStore for SqliteEventStore {
    fn upsert(&self, event: &AccessEvent) -> Result<(), PersistenceError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO access_events (event_uuid, username, unix_timestamp, ip_address)
             VALUES (?, ?, ?, ?)",
            params![
                event.event_uuid,
                event.username,
                event.unix_timestamp,
                event.ip_address
            ],
        )?;

        if inserted == 0 {
            log::debug!("Event {} already stored, keeping original", event.event_uuid);
        }
        Ok(())
    }

    fn find_preceding(
        &self,
        username: &str,
        timestamp: i64,
        exclude_id: &str,
    ) -> Result<Option<AccessEvent>, PersistenceError> {
        self.query_event(
            &format!(
                "SELECT {EVENT_COLUMNS} FROM access_events
                 WHERE username = ? AND unix_timestamp <= ? AND event_uuid != ?
                 ORDER BY unix_timestamp DESC, event_uuid ASC
                 LIMIT 1"
            ),
            params![username, timestamp, exclude_id],
        )
    }

    fn find_subsequent(
        &self,
        username: &str,
        timestamp: i64,
        exclude_id: &str,
    ) -> Result<Option<AccessEvent>, PersistenceError> {
        self.query_event(
            &format!(
                "SELECT {EVENT_COLUMNS} FROM access_events
                 WHERE username = ? AND unix_timestamp >= ? AND event_uuid != ?
                 ORDER BY unix_timestamp ASC, event_uuid ASC
                 LIMIT 1"
            ),
            params![username, timestamp, exclude_id],
        )
    }

    fn get(&self, event_id: &str) -> Result<Option<AccessEvent>, PersistenceError> {
        self.query_event(
            &format!("SELECT {EVENT_COLUMNS} FROM access_events WHERE event_uuid = ?"),
            params![event_id],
        )
    }

    fn count_for_user(&self, username: &str) -> Result<usize, PersistenceError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM access_events WHERE username = ?",
            params![username],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
