//! ledger-domain
//!
//! Event envelope, event payload variants, projection record types, and
//! content-addressed transaction identity. No storage, no business logic.

pub mod event;
pub mod identity;
pub mod projection;

pub use event::{Event, EventPayload};
pub use identity::transaction_id;
pub use projection::{BudgetPeriodType, BudgetRecord, TransactionRecord};
