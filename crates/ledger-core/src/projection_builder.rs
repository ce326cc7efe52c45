use ledger_domain::event::EventPayload;
use ledger_domain::{Event, TransactionRecord};
use tracing::warn;

use crate::error::CoreError;
use crate::event_log::EventLog;
use crate::projection_store::{BudgetProjectionStore, ProjectionMetadataStore, TransactionProjectionStore};

/// Transforms the event log into the materialized transaction and
/// budget projections, idempotently and deterministically.
///
/// Dispatch is an exhaustive `match` over `EventPayload` (see §9's
/// "tagged union and exhaustive matching" design note): the compiler
/// guarantees every event variant has exactly one handler here.
pub struct ProjectionBuilder<'a, L, T, B, M> {
    event_log: &'a L,
    transactions: &'a T,
    budgets: &'a B,
    metadata: &'a M,
}

impl<'a, L, T, B, M> ProjectionBuilder<'a, L, T, B, M>
where
    L: EventLog,
    T: TransactionProjectionStore,
    B: BudgetProjectionStore,
    M: ProjectionMetadataStore,
{
    pub fn new(event_log: &'a L, transactions: &'a T, budgets: &'a B, metadata: &'a M) -> Self {
        Self {
            event_log,
            transactions,
            budgets,
            metadata,
        }
    }

    /// Clears both projections and the metadata pointer, then applies
    /// every event in sequence order. Returns the count processed.
    pub fn rebuild_from_scratch(&self) -> Result<usize, CoreError> {
        self.transactions.clear()?;
        self.budgets.clear()?;
        self.metadata.clear()?;
        let events = self.event_log.get_all()?;
        self.apply_batch(&events)?;
        self.metadata.set_last_sequence(self.event_log.latest_sequence()?)?;
        tracing::info!(count = events.len(), "rebuilt projections from scratch");
        Ok(events.len())
    }

    /// Reads the stored last-applied sequence, retrieves subsequent
    /// events, applies them, and advances the pointer. Returns 0 if
    /// already current.
    pub fn rebuild_incremental(&self) -> Result<usize, CoreError> {
        let last_sequence = self.metadata.get_last_sequence()?;
        let new_events = self.event_log.get_since(last_sequence)?;
        if new_events.is_empty() {
            return Ok(0);
        }
        let latest = self.event_log.latest_sequence()?;
        self.apply_batch(&new_events)?;
        self.metadata.set_last_sequence(latest)?;
        tracing::info!(count = new_events.len(), "applied incremental events");
        Ok(new_events.len())
    }

    /// Applies every event to the projections. The metadata pointer is
    /// updated by the caller after the whole batch commits, not per
    /// event — `apply_batch` itself never touches `metadata`.
    fn apply_batch(&self, events: &[Event]) -> Result<(), CoreError> {
        for event in events {
            self.apply_one(event)?;
        }
        Ok(())
    }

    fn apply_one(&self, event: &Event) -> Result<(), CoreError> {
        match &event.payload {
            EventPayload::TransactionImported(p) => {
                if self.transactions.get(&p.transaction_id)?.is_some() {
                    return Ok(());
                }
                let record = TransactionRecord::from_imported(
                    event.event_id,
                    p.transaction_id.clone(),
                    p.date,
                    p.amount,
                    p.currency.clone(),
                    p.source_account.clone(),
                    p.source_file.clone(),
                    p.raw_description.clone(),
                );
                self.transactions.upsert(&record)
            }
            EventPayload::TransactionDescriptionObserved(p) => {
                let Some(mut original) = self.transactions.get(&p.original_transaction_id)? else {
                    warn!(
                        original_transaction_id = %p.original_transaction_id,
                        "description-observed event references absent original; skipping"
                    );
                    return Ok(());
                };
                original.canonical_description = p.new_description.clone();
                if !original
                    .description_history
                    .iter()
                    .any(|d| d == &p.new_description)
                {
                    original.description_history.push(p.new_description.clone());
                }
                original.last_event_id = event.event_id;
                self.transactions.upsert(&original)?;

                if let Some(mut variant) = self.transactions.get(&p.new_transaction_id)? {
                    variant.is_duplicate = true;
                    variant.primary_transaction_id = Some(p.original_transaction_id.clone());
                    variant.last_event_id = event.event_id;
                    self.transactions.upsert(&variant)?;
                }
                Ok(())
            }
            EventPayload::TransactionCategorized(p) => {
                let Some(mut record) = self.transactions.get(&p.transaction_id)? else {
                    warn!(transaction_id = %p.transaction_id, "categorized event references absent transaction; skipping");
                    return Ok(());
                };
                record.category = Some(p.category.clone());
                record.subcategory = p.subcategory.clone();
                record.last_event_id = event.event_id;
                self.transactions.upsert(&record)
            }
            EventPayload::TransactionEnriched(p) => {
                let Some(mut record) = self.transactions.get(&p.transaction_id)? else {
                    warn!(transaction_id = %p.transaction_id, "enriched event references absent transaction; skipping");
                    return Ok(());
                };
                record.counterparty = Some(p.vendor.clone());
                record.last_event_id = event.event_id;
                self.transactions.upsert(&record)
            }
            EventPayload::DuplicateConfirmed(p) => {
                let Some(mut primary) = self.transactions.get(&p.primary_transaction_id)? else {
                    warn!(primary_transaction_id = %p.primary_transaction_id, "confirmed event references absent primary; skipping");
                    return Ok(());
                };
                primary.canonical_description = p.canonical_description.clone();
                primary.last_event_id = event.event_id;
                self.transactions.upsert(&primary)?;

                let Some(mut duplicate) = self.transactions.get(&p.duplicate_transaction_id)? else {
                    warn!(duplicate_transaction_id = %p.duplicate_transaction_id, "confirmed event references absent duplicate; skipping");
                    return Ok(());
                };
                duplicate.is_duplicate = true;
                duplicate.primary_transaction_id = Some(p.primary_transaction_id.clone());
                duplicate.last_event_id = event.event_id;
                self.transactions.upsert(&duplicate)
            }
            EventPayload::DuplicateRejected(_) => {
                // No projection state change. The event itself, already in
                // the log, is what suppresses the pair from future scans.
                Ok(())
            }
            EventPayload::BudgetCreated(p) => {
                let record = ledger_domain::BudgetRecord {
                    budget_id: p.budget_id.clone(),
                    category: p.category.clone(),
                    subcategory: p.subcategory.clone(),
                    period_type: p.period_type,
                    start_date: p.start_date,
                    amount: p.amount,
                    currency: p.currency.clone(),
                    is_active: true,
                };
                self.budgets.upsert(&record)
            }
            EventPayload::BudgetUpdated(p) => {
                let Some(mut record) = self.budgets.get(&p.budget_id)? else {
                    warn!(budget_id = %p.budget_id, "updated event references absent budget; skipping");
                    return Ok(());
                };
                if let Some(category) = &p.category {
                    record.category = category.clone();
                }
                if p.subcategory.is_some() {
                    record.subcategory = p.subcategory.clone();
                }
                if let Some(period_type) = p.period_type {
                    record.period_type = period_type;
                }
                if let Some(amount) = p.amount {
                    record.amount = amount;
                }
                if let Some(currency) = &p.currency {
                    record.currency = currency.clone();
                }
                self.budgets.upsert(&record)
            }
            EventPayload::BudgetDeleted(p) => {
                let Some(mut record) = self.budgets.get(&p.budget_id)? else {
                    warn!(budget_id = %p.budget_id, "deleted event references absent budget; skipping");
                    return Ok(());
                };
                record.is_active = false;
                self.budgets.upsert(&record)
            }
            // Retained for audit and learning; no projection mutation.
            EventPayload::CategorizationRuleCreated(_)
            | EventPayload::PromptUpdated(_)
            | EventPayload::DuplicateSuggested(_) => Ok(()),
        }
    }

    /// Reports dangling references in the current projection without
    /// mutating anything: duplicate records whose primary is missing,
    /// and active budgets with no counterpart check beyond existence
    /// (budgets have no foreign keys into transactions today, so this
    /// currently only covers the duplicate-linkage invariant).
    pub fn audit(&self) -> Result<Vec<String>, CoreError> {
        let mut warnings = Vec::new();
        for record in self.transactions.get_all(true)? {
            if record.is_duplicate {
                match &record.primary_transaction_id {
                    None => warnings.push(format!(
                        "transaction {} is marked duplicate with no primary_transaction_id",
                        record.transaction_id
                    )),
                    Some(primary_id) => {
                        if self.transactions.get(primary_id)?.is_none() {
                            warnings.push(format!(
                                "transaction {} references missing primary {}",
                                record.transaction_id, primary_id
                            ));
                        }
                    }
                }
            }
        }
        Ok(warnings)
    }
}
