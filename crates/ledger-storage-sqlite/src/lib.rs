//! ledger-storage-sqlite
//!
//! rusqlite-backed implementations of `ledger-core`'s `EventLog` and
//! projection-store traits. One physical file per logical store:
//! `events.db`, `projections.db`, `budget_projections.db`. Connections
//! are opened per operation; there is no pool, matching the core's
//! single-writer, synchronous concurrency model.

pub mod budget_projection;
pub mod error;
pub mod event_store;
pub mod metadata;
pub mod transaction_projection;

pub use budget_projection::SqliteBudgetProjectionStore;
pub use error::StoreError;
pub use event_store::{is_empty_or_absent, SqliteEventLog};
pub use metadata::SqliteProjectionMetadataStore;
pub use transaction_projection::SqliteTransactionProjectionStore;
