use thiserror::Error;

/// The error taxonomy shared by every `ledger-core` service.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error for event {event_id}: {source}")]
    Serialization {
        event_id: String,
        source: serde_json::Error,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("budget not found: {0}")]
    BudgetNotFound(String),
    #[error("classifier requires at least 10 labeled examples, got {0}")]
    InsufficientTrainingData(usize),
    #[error("classifier was asked to predict before training")]
    UntrainedModel,
    #[error("re-applying event {0} would corrupt projection state")]
    IdempotencyViolation(String),
}
