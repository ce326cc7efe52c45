use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::event::BudgetPeriodType;

/// Materialized current view of one transaction identity.
///
/// Invariants upheld by the projection builder, never by callers:
/// `description_history` always contains at least the original
/// `raw_description` and is duplicate-free; `canonical_description` is
/// always its last element; `is_duplicate == true` implies
/// `primary_transaction_id` names a non-duplicate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub transaction_date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub account_id: String,
    pub source_file: String,

    pub canonical_description: String,
    pub description_history: Vec<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub counterparty: Option<String>,
    pub notes: Option<String>,

    pub is_duplicate: bool,
    pub primary_transaction_id: Option<String>,

    pub last_event_id: Uuid,
    pub projection_version: u32,
}

impl TransactionRecord {
    pub fn from_imported(
        event_id: Uuid,
        transaction_id: String,
        transaction_date: NaiveDate,
        amount: Decimal,
        currency: String,
        account_id: String,
        source_file: String,
        raw_description: String,
    ) -> Self {
        Self {
            transaction_id,
            transaction_date,
            amount,
            currency,
            account_id,
            source_file,
            canonical_description: raw_description.clone(),
            description_history: vec![raw_description],
            category: None,
            subcategory: None,
            counterparty: None,
            notes: None,
            is_duplicate: false,
            primary_transaction_id: None,
            last_event_id: event_id,
            projection_version: 1,
        }
    }
}

/// Materialized current view of one budget allocation. Active iff its
/// most recent event was `BudgetCreated`/`BudgetUpdated`, not
/// `BudgetDeleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub budget_id: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub period_type: BudgetPeriodType,
    pub start_date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub is_active: bool,
}
