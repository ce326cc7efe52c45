use std::path::PathBuf;

use ledger_core::{CoreError, ProjectionMetadataStore};
use rusqlite::Connection;

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projection_metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const LAST_SEQUENCE_KEY: &str = "last_sequence";

/// Lives in the same physical file as the transaction projection, the
/// way the original keeps `projection_metadata` alongside
/// `transaction_projections`.
pub struct SqliteProjectionMetadataStore {
    db_path: PathBuf,
}

impl SqliteProjectionMetadataStore {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { db_path })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }
}

impl ProjectionMetadataStore for SqliteProjectionMetadataStore {
    fn get_last_sequence(&self) -> Result<u64, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let result: Result<String, rusqlite::Error> = conn.query_row(
            "SELECT value FROM projection_metadata WHERE key = ?1",
            rusqlite::params![LAST_SEQUENCE_KEY],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(value.parse().unwrap_or(0)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(CoreError::from(StoreError::from(e))),
        }
    }

    fn set_last_sequence(&self, sequence: u64) -> Result<(), CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        conn.execute(
            "INSERT INTO projection_metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![LAST_SEQUENCE_KEY, sequence.to_string()],
        )
        .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        conn.execute("DELETE FROM projection_metadata", [])
            .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(())
    }
}
