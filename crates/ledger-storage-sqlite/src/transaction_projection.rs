use std::path::PathBuf;
use std::str::FromStr;

use ledger_core::{CoreError, TransactionProjectionStore};
use ledger_domain::TransactionRecord;
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transaction_projections (
    transaction_id TEXT PRIMARY KEY,
    transaction_date TEXT NOT NULL,
    canonical_description TEXT NOT NULL,
    description_history TEXT NOT NULL,
    amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    account_id TEXT NOT NULL,
    category TEXT,
    subcategory TEXT,
    counterparty TEXT,
    notes TEXT,
    source_file TEXT,
    is_duplicate INTEGER NOT NULL DEFAULT 0,
    primary_transaction_id TEXT,
    last_event_id TEXT NOT NULL,
    projection_version INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_txn_proj_date ON transaction_projections(transaction_date);
CREATE INDEX IF NOT EXISTS idx_txn_proj_account ON transaction_projections(account_id);
CREATE INDEX IF NOT EXISTS idx_txn_proj_category ON transaction_projections(category, subcategory);
"#;

pub struct SqliteTransactionProjectionStore {
    db_path: PathBuf,
}

impl SqliteTransactionProjectionStore {
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

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TransactionRecord> {
    let history_json: String = row.get("description_history")?;
    let description_history: Vec<String> = serde_json::from_str(&history_json).unwrap_or_default();
    let amount_str: String = row.get("amount")?;
    let date_str: String = row.get("transaction_date")?;
    let last_event_id_str: String = row.get("last_event_id")?;

    Ok(TransactionRecord {
        transaction_id: row.get("transaction_id")?,
        transaction_date: chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap(),
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        currency: row.get("currency")?,
        account_id: row.get("account_id")?,
        source_file: row.get::<_, Option<String>>("source_file")?.unwrap_or_default(),
        canonical_description: row.get("canonical_description")?,
        description_history,
        category: row.get("category")?,
        subcategory: row.get("subcategory")?,
        counterparty: row.get("counterparty")?,
        notes: row.get("notes")?,
        is_duplicate: row.get::<_, i64>("is_duplicate")? != 0,
        primary_transaction_id: row.get("primary_transaction_id")?,
        last_event_id: Uuid::parse_str(&last_event_id_str).unwrap_or_default(),
        projection_version: row.get::<_, i64>("projection_version")? as u32,
    })
}

impl TransactionProjectionStore for SqliteTransactionProjectionStore {
    fn clear(&self) -> Result<(), CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        conn.execute("DELETE FROM transaction_projections", [])
            .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(())
    }

    fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let result = conn.query_row(
            "SELECT * FROM transaction_projections WHERE transaction_id = ?1",
            rusqlite::params![transaction_id],
            row_to_record,
        );
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CoreError::from(StoreError::from(e))),
        }
    }

    fn upsert(&self, record: &TransactionRecord) -> Result<(), CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let history_json = serde_json::to_string(&record.description_history).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            "INSERT INTO transaction_projections
                (transaction_id, transaction_date, canonical_description, description_history,
                 amount, currency, account_id, category, subcategory, counterparty, notes,
                 source_file, is_duplicate, primary_transaction_id, last_event_id, projection_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(transaction_id) DO UPDATE SET
                canonical_description = excluded.canonical_description,
                description_history = excluded.description_history,
                category = excluded.category,
                subcategory = excluded.subcategory,
                counterparty = excluded.counterparty,
                notes = excluded.notes,
                is_duplicate = excluded.is_duplicate,
                primary_transaction_id = excluded.primary_transaction_id,
                last_event_id = excluded.last_event_id,
                projection_version = excluded.projection_version",
            rusqlite::params![
                record.transaction_id,
                record.transaction_date.format("%Y-%m-%d").to_string(),
                record.canonical_description,
                history_json,
                record.amount.to_string(),
                record.currency,
                record.account_id,
                record.category,
                record.subcategory,
                record.counterparty,
                record.notes,
                record.source_file,
                record.is_duplicate as i64,
                record.primary_transaction_id,
                record.last_event_id.to_string(),
                record.projection_version as i64,
            ],
        )
        .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(())
    }

    fn get_all(&self, include_duplicates: bool) -> Result<Vec<TransactionRecord>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let sql = if include_duplicates {
            "SELECT * FROM transaction_projections ORDER BY transaction_date, account_id, transaction_id"
        } else {
            "SELECT * FROM transaction_projections WHERE is_duplicate = 0
             ORDER BY transaction_date, account_id, transaction_id"
        };
        let mut stmt = conn.prepare(sql).map_err(|e| CoreError::from(StoreError::from(e)))?;
        let rows = stmt
            .query_map([], row_to_record)
            .map_err(|e| CoreError::from(StoreError::from(e)))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| CoreError::from(StoreError::from(e)))?);
        }
        Ok(records)
    }
}
