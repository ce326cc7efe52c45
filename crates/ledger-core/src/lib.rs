//! ledger-core
//!
//! Event log and projection-store traits, the projection builder,
//! duplicate detection pipeline, review workflow service, and
//! categorization-rule/training helpers. Depends on ledger-domain.
//! No storage engine, no CLI, no terminal I/O.

pub mod duplicate;
pub mod error;
pub mod event_log;
pub mod ingest;
pub mod projection_builder;
pub mod projection_store;
pub mod prompt;
pub mod review;
pub mod rules;
pub mod training;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing for embedders that have not already set up
/// their own subscriber. Safe to call more than once; only the first call
/// takes effect.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
        tracing::info!("ledger-core tracing initialized");
    });
}

pub use duplicate::{
    find_candidate_pairs, resolved_pairs, scan_transactions, suppress_resolved, Classifier,
    DetectionParams, DuplicateMatch, TrainingMetrics, MIN_TRAINING_EXAMPLES,
};
pub use error::CoreError;
pub use event_log::EventLog;
pub use ingest::{IngestOutcome, IngestRow, IngestService};
pub use projection_builder::ProjectionBuilder;
pub use projection_store::{BudgetProjectionStore, ProjectionMetadataStore, TransactionProjectionStore};
pub use prompt::learned_patterns_as_of;
pub use review::{ReviewChoice, ReviewDecision, ReviewSummary, ReviewWorkflowService};
pub use rules::CategorizationRuleService;
pub use training::training_pairs;
