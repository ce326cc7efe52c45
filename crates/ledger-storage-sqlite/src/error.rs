use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to (de)serialize event {event_id}: {source}")]
    Serde {
        event_id: String,
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ledger_core::CoreError {
    fn from(err: StoreError) -> Self {
        ledger_core::CoreError::Storage(err.to_string())
    }
}
