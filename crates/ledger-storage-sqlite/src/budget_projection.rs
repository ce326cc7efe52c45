use std::path::PathBuf;
use std::str::FromStr;

use ledger_core::{BudgetProjectionStore, CoreError};
use ledger_domain::event::BudgetPeriodType;
use ledger_domain::BudgetRecord;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS budget_projections (
    budget_id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    subcategory TEXT,
    period_type TEXT NOT NULL,
    start_date TEXT NOT NULL,
    amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);
"#;

pub struct SqliteBudgetProjectionStore {
    db_path: PathBuf,
}

impl SqliteBudgetProjectionStore {
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

fn period_type_to_str(period: BudgetPeriodType) -> &'static str {
    match period {
        BudgetPeriodType::Monthly => "monthly",
        BudgetPeriodType::Yearly => "yearly",
    }
}

fn period_type_from_str(s: &str) -> BudgetPeriodType {
    match s {
        "yearly" => BudgetPeriodType::Yearly,
        _ => BudgetPeriodType::Monthly,
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<BudgetRecord> {
    let amount_str: String = row.get("amount")?;
    let start_date_str: String = row.get("start_date")?;
    let period_type_str: String = row.get("period_type")?;
    Ok(BudgetRecord {
        budget_id: row.get("budget_id")?,
        category: row.get("category")?,
        subcategory: row.get("subcategory")?,
        period_type: period_type_from_str(&period_type_str),
        start_date: chrono::NaiveDate::parse_from_str(&start_date_str, "%Y-%m-%d").unwrap(),
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        currency: row.get("currency")?,
        is_active: row.get::<_, i64>("is_active")? != 0,
    })
}

impl BudgetProjectionStore for SqliteBudgetProjectionStore {
    fn clear(&self) -> Result<(), CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        conn.execute("DELETE FROM budget_projections", [])
            .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(())
    }

    fn get(&self, budget_id: &str) -> Result<Option<BudgetRecord>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let result = conn.query_row(
            "SELECT * FROM budget_projections WHERE budget_id = ?1",
            rusqlite::params![budget_id],
            row_to_record,
        );
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CoreError::from(StoreError::from(e))),
        }
    }

    fn upsert(&self, record: &BudgetRecord) -> Result<(), CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        conn.execute(
            "INSERT INTO budget_projections
                (budget_id, category, subcategory, period_type, start_date, amount, currency, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(budget_id) DO UPDATE SET
                category = excluded.category,
                subcategory = excluded.subcategory,
                period_type = excluded.period_type,
                amount = excluded.amount,
                currency = excluded.currency,
                is_active = excluded.is_active",
            rusqlite::params![
                record.budget_id,
                record.category,
                record.subcategory,
                period_type_to_str(record.period_type),
                record.start_date.format("%Y-%m-%d").to_string(),
                record.amount.to_string(),
                record.currency,
                record.is_active as i64,
            ],
        )
        .map_err(|e| CoreError::from(StoreError::from(e)))?;
        Ok(())
    }

    fn get_active(&self) -> Result<Vec<BudgetRecord>, CoreError> {
        let conn = self.connect().map_err(CoreError::from)?;
        let mut stmt = conn
            .prepare("SELECT * FROM budget_projections WHERE is_active = 1")
            .map_err(|e| CoreError::from(StoreError::from(e)))?;
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
