use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lightweight snapshot of a transaction as it existed when a
/// duplicate candidate pair was formed. Carried inside `DuplicateSuggested`
/// so the suggestion event is self-contained and training data can be
/// reconstructed from the event log alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub account_id: String,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPair {
    pub txn1: TransactionSnapshot,
    pub txn2: TransactionSnapshot,
}

impl TransactionPair {
    pub fn txn1_id(&self) -> &str {
        &self.txn1.transaction_id
    }

    pub fn txn2_id(&self) -> &str {
        &self.txn2.transaction_id
    }

    pub fn txn1_description(&self) -> &str {
        &self.txn1.description
    }

    pub fn txn2_description(&self) -> &str {
        &self.txn2.description
    }
}

/// A classifier's (or oracle's) opinion about a candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub is_duplicate: bool,
    pub confidence: f64,
    pub reasoning: String,
}

/// The object embedded in `DuplicateSuggested.assessment`. Carries
/// exactly `is_duplicate`, `confidence`, `reasoning`, and the full pair
/// — never derived booleans like "same_date", which are recomputable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionAssessment {
    pub is_duplicate: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub pair: TransactionPair,
}

impl SuggestionAssessment {
    pub fn new(assessment: Assessment, pair: TransactionPair) -> Self {
        Self {
            is_duplicate: assessment.is_duplicate,
            confidence: assessment.confidence,
            reasoning: assessment.reasoning,
            pair,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorizationSource {
    User,
    Llm,
    Rule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionImported {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub source_file: String,
    pub source_account: String,
    pub raw_description: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub raw_data: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDescriptionObserved {
    pub original_transaction_id: String,
    pub new_transaction_id: String,
    pub date: NaiveDate,
    pub old_description: String,
    pub new_description: String,
    pub source_file: String,
    pub source_account: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCategorized {
    pub transaction_id: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub source: CategorizationSource,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub previous_category: Option<String>,
    #[serde(default)]
    pub previous_subcategory: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEnriched {
    pub transaction_id: String,
    pub vendor: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_type: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub receipt_file: Option<String>,
    pub enrichment_source: String,
    #[serde(default)]
    pub match_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSuggested {
    pub transaction_id_1: String,
    pub transaction_id_2: String,
    pub confidence: f64,
    pub reasoning: String,
    pub model: String,
    pub prompt_version: String,
    pub assessment: SuggestionAssessment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateConfirmed {
    pub suggestion_event_id: Uuid,
    pub primary_transaction_id: String,
    pub duplicate_transaction_id: String,
    pub canonical_description: String,
    #[serde(default)]
    pub user_rationale: Option<String>,
    pub llm_was_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRejected {
    pub suggestion_event_id: Uuid,
    pub transaction_id_1: String,
    pub transaction_id_2: String,
    #[serde(default)]
    pub user_rationale: Option<String>,
    pub llm_was_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationRuleCreated {
    pub rule_id: Uuid,
    pub rule_type: String,
    pub pattern: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriodType {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetCreated {
    pub budget_id: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub period_type: BudgetPeriodType,
    pub start_date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetUpdated {
    pub budget_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub period_type: Option<BudgetPeriodType>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetDeleted {
    pub budget_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptUpdated {
    pub prompt_version: String,
    #[serde(default)]
    pub previous_version: Option<String>,
    #[serde(default)]
    pub learned_patterns: Vec<String>,
    #[serde(default)]
    pub accuracy_metrics: HashMap<String, f64>,
}

/// The event-specific payload, tagged by `event_type` on the wire. This
/// is the tagged union §9 calls for: the compiler enforces that every
/// variant listed here has exactly the fields its handler expects, and
/// an exhaustive `match` over this enum (see `ledger-core`'s projection
/// builder) is the dispatch table itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum EventPayload {
    TransactionImported(TransactionImported),
    TransactionDescriptionObserved(TransactionDescriptionObserved),
    TransactionCategorized(TransactionCategorized),
    TransactionEnriched(TransactionEnriched),
    DuplicateSuggested(DuplicateSuggested),
    DuplicateConfirmed(DuplicateConfirmed),
    DuplicateRejected(DuplicateRejected),
    CategorizationRuleCreated(CategorizationRuleCreated),
    BudgetCreated(BudgetCreated),
    BudgetUpdated(BudgetUpdated),
    BudgetDeleted(BudgetDeleted),
    PromptUpdated(PromptUpdated),
}

impl EventPayload {
    /// Discriminator string as stored in the `event_type` column.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::TransactionImported(_) => "TransactionImported",
            EventPayload::TransactionDescriptionObserved(_) => "TransactionDescriptionObserved",
            EventPayload::TransactionCategorized(_) => "TransactionCategorized",
            EventPayload::TransactionEnriched(_) => "TransactionEnriched",
            EventPayload::DuplicateSuggested(_) => "DuplicateSuggested",
            EventPayload::DuplicateConfirmed(_) => "DuplicateConfirmed",
            EventPayload::DuplicateRejected(_) => "DuplicateRejected",
            EventPayload::CategorizationRuleCreated(_) => "CategorizationRuleCreated",
            EventPayload::BudgetCreated(_) => "BudgetCreated",
            EventPayload::BudgetUpdated(_) => "BudgetUpdated",
            EventPayload::BudgetDeleted(_) => "BudgetDeleted",
            EventPayload::PromptUpdated(_) => "PromptUpdated",
        }
    }

    /// The aggregate this event concerns, as `(aggregate_type, aggregate_id)`.
    pub fn aggregate(&self) -> (&'static str, String) {
        match self {
            EventPayload::TransactionImported(p) => ("transaction", p.transaction_id.clone()),
            EventPayload::TransactionDescriptionObserved(p) => {
                ("transaction", p.original_transaction_id.clone())
            }
            EventPayload::TransactionCategorized(p) => ("transaction", p.transaction_id.clone()),
            EventPayload::TransactionEnriched(p) => ("transaction", p.transaction_id.clone()),
            EventPayload::DuplicateSuggested(p) => (
                "duplicate",
                format!("{}:{}", p.transaction_id_1, p.transaction_id_2),
            ),
            EventPayload::DuplicateConfirmed(p) => (
                "duplicate",
                format!("{}:{}", p.primary_transaction_id, p.duplicate_transaction_id),
            ),
            EventPayload::DuplicateRejected(p) => (
                "duplicate",
                format!("{}:{}", p.transaction_id_1, p.transaction_id_2),
            ),
            EventPayload::CategorizationRuleCreated(p) => ("rule", p.rule_id.to_string()),
            EventPayload::BudgetCreated(p) => ("budget", p.budget_id.clone()),
            EventPayload::BudgetUpdated(p) => ("budget", p.budget_id.clone()),
            EventPayload::BudgetDeleted(p) => ("budget", p.budget_id.clone()),
            EventPayload::PromptUpdated(p) => ("prompt", p.prompt_version.clone()),
        }
    }
}

/// The envelope every event is wrapped in before it reaches the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub event_timestamp: DateTime<Utc>,
    pub aggregate_type: String,
    pub aggregate_id: String,
    #[serde(flatten)]
    pub payload: EventPayload,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Event {
    pub fn new(event_timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        let (aggregate_type, aggregate_id) = payload.aggregate();
        Self {
            event_id: Uuid::new_v4(),
            event_timestamp,
            aggregate_type: aggregate_type.to_string(),
            aggregate_id,
            payload,
            metadata: HashMap::new(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
