use std::path::{Path, PathBuf};

use ledger_core::{CoreError, EventLog};
use ledger_domain::Event;
use rusqlite::Connection;

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id TEXT PRIMARY KEY,
    event_type TEXT NOT NULL,
    event_timestamp TEXT NOT NULL,
    aggregate_type TEXT,
    aggregate_id TEXT,
    event_data TEXT NOT NULL,
    metadata TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(event_timestamp);
CREATE INDEX IF NOT EXISTS idx_events_aggregate ON events(aggregate_type, aggregate_id);

CREATE TABLE IF NOT EXISTS event_sequence (
    sequence_number INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL REFERENCES events(event_id)
);
"#;

/// An append-only, sequenced SQLite-backed event log. Opens and closes a
/// connection per operation rather than pooling one: the core is
/// single-writer and synchronous (see its concurrency model), so a pool
/// would only add unneeded machinery.
pub struct SqliteEventLog {
    db_path: PathBuf,
}

impl SqliteEventLog {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { db_path })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn row_to_event(event_data: &str, event_id: &str) -> Result<Event, StoreError> {
        serde_json::from_str(event_data).map_err(|source| StoreError::Serde {
            event_id: event_id.to_string(),
            source,
        })
    }
}

fn query_events(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Event>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        let event_id: String = row.get(0)?;
        let event_data: String = row.get(1)?;
        Ok((event_id, event_data))
    })?;
    let mut events = Vec::new();
    for row in rows {
        let (event_id, event_data) = row?;
        events.push(SqliteEventLog::row_to_event(&event_data, &event_id)?);
    }
    Ok(events)
}

impl EventLog for SqliteEventLog {
    fn append(&self, event: &Event) -> Result<u64, CoreError> {
        let mut conn = self.connect().map_err(CoreError::from)?;
        let event_data = serde_json::to_string(event).map_err(|source| {
            CoreError::from(StoreError::Serde {
                event_id: event.event_id.to_string(),
                source,
            })
        })?;
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_else(|_| "{}".to_string());

        let tx = conn.transaction().map_err(|e| CoreError::from(StoreError::from(e)))?;
        tx.execute(
            "INSERT INTO events (event_id, event_type, event_timestamp, aggregate_type, aggregate_id, event_data, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                event.event_id.to_string(),
                event.event_type(),
                event.event_timestamp.to_rfc3339(),
                event.aggregate_type,
                event.aggregate_id,
                event_data,
                metadata,
            ],
        )
        .map_err(|e| CoreError::from(StoreError::from(e)))?;
        tx.execute(
            "INSERT INTO event_sequence (event_id) VALUES (?1)",
            rusqlite::params![event.event_id.to_string()],
        )
        .map_err(|e| CoreError::from(StoreError::from(e)))?;
        let sequence_number: i64 = tx.last_insert_rowid();
        tx.commit().map_err(|e| CoreError::from(StoreError::from(e)))?;

        tracing::info!(event_type = event.event_type(), sequence_number, "appended event");
        Ok(sequence_number as u64)
    }

    fn get_all(&self) -> Result<Vec<Event>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        query_events(
            &conn,
            "SELECT e.event_id, e.event_data FROM events e
             JOIN event_sequence s ON s.event_id = e.event_id
             ORDER BY s.sequence_number ASC",
            &[],
        )
        .map_err(CoreError::from)
    }

    fn get_by_type(&self, event_type: &str) -> Result<Vec<Event>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        query_events(
            &conn,
            "SELECT e.event_id, e.event_data FROM events e
             JOIN event_sequence s ON s.event_id = e.event_id
             WHERE e.event_type = ?1
             ORDER BY s.sequence_number ASC",
            &[&event_type],
        )
        .map_err(CoreError::from)
    }

    fn get_by_aggregate(&self, aggregate_type: &str, aggregate_id: &str) -> Result<Vec<Event>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        query_events(
            &conn,
            "SELECT e.event_id, e.event_data FROM events e
             JOIN event_sequence s ON s.event_id = e.event_id
             WHERE e.aggregate_type = ?1 AND e.aggregate_id = ?2
             ORDER BY s.sequence_number ASC",
            &[&aggregate_type, &aggregate_id],
        )
        .map_err(CoreError::from)
    }

    fn get_since(&self, sequence_number: u64) -> Result<Vec<Event>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        query_events(
            &conn,
            "SELECT e.event_id, e.event_data FROM events e
             JOIN event_sequence s ON s.event_id = e.event_id
             WHERE s.sequence_number > ?1
             ORDER BY s.sequence_number ASC",
            &[&(sequence_number as i64)],
        )
        .map_err(CoreError::from)
    }

    fn latest_sequence(&self) -> Result<u64, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let max: Option<i64> = conn
            .query_row("SELECT MAX(sequence_number) FROM event_sequence", [], |row| row.get(0))
            .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(max.unwrap_or(0) as u64)
    }
}

/// Path-only convenience used by the migration service to detect an
/// absent or empty event log before backfilling.
pub fn is_empty_or_absent(db_path: &Path) -> Result<bool, StoreError> {
    if !db_path.exists() {
        return Ok(true);
    }
    let conn = Connection::open(db_path)?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0)).unwrap_or(0);
    Ok(count == 0)
}
