use ledger_domain::{BudgetRecord, TransactionRecord};

use crate::error::CoreError;

/// Materialized, queryable transaction projection. `rebuild_from_scratch`
/// goes through this store via `clear` + repeated `upsert`; incremental
/// replay goes through `upsert` alone.
pub trait TransactionProjectionStore {
    fn clear(&self) -> Result<(), CoreError>;
    fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, CoreError>;
    fn upsert(&self, record: &TransactionRecord) -> Result<(), CoreError>;
    /// All transactions, ordered by `(transaction_date, account_id)`.
    /// Excludes records with `is_duplicate = true` unless
    /// `include_duplicates` is set.
    fn get_all(&self, include_duplicates: bool) -> Result<Vec<TransactionRecord>, CoreError>;
}

/// Materialized, queryable budget projection.
pub trait BudgetProjectionStore {
    fn clear(&self) -> Result<(), CoreError>;
    fn get(&self, budget_id: &str) -> Result<Option<BudgetRecord>, CoreError>;
    fn upsert(&self, record: &BudgetRecord) -> Result<(), CoreError>;
    fn get_active(&self) -> Result<Vec<BudgetRecord>, CoreError>;
}

/// The `(key, value)` table tracking the last-applied event sequence
/// number — the sole basis for distinguishing an up-to-date projection
/// from a stale one.
pub trait ProjectionMetadataStore {
    fn get_last_sequence(&self) -> Result<u64, CoreError>;
    fn set_last_sequence(&self, sequence: u64) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
}
