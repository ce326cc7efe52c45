use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use ledger_core::{
    find_candidate_pairs, suppress_resolved, CoreError, DetectionParams, EventLog,
    ProjectionBuilder, ProjectionMetadataStore, ReviewChoice, ReviewDecision, ReviewWorkflowService,
    TransactionProjectionStore,
};
use ledger_core::{BudgetProjectionStore, Classifier, TrainingMetrics};
use ledger_domain::event::{Assessment, TransactionPair};
use ledger_domain::{BudgetRecord, Event, TransactionRecord};
use rust_decimal_macros::dec;

#[derive(Default)]
struct MemoryEventLog {
    events: RefCell<Vec<Event>>,
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: &Event) -> Result<u64, CoreError> {
        self.events.borrow_mut().push(event.clone());
        Ok(self.events.borrow().len() as u64)
    }

    fn get_all(&self) -> Result<Vec<Event>, CoreError> {
        Ok(self.events.borrow().clone())
    }

    fn get_by_type(&self, event_type: &str) -> Result<Vec<Event>, CoreError> {
        Ok(self
            .events
            .borrow()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect())
    }

    fn get_by_aggregate(&self, aggregate_type: &str, aggregate_id: &str) -> Result<Vec<Event>, CoreError> {
        Ok(self
            .events
            .borrow()
            .iter()
            .filter(|e| e.aggregate_type == aggregate_type && e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    fn get_since(&self, sequence_number: u64) -> Result<Vec<Event>, CoreError> {
        let events = self.events.borrow();
        Ok(events
            .iter()
            .skip(sequence_number as usize)
            .cloned()
            .collect())
    }

    fn latest_sequence(&self) -> Result<u64, CoreError> {
        Ok(self.events.borrow().len() as u64)
    }
}

#[derive(Default)]
struct MemoryTransactionStore {
    records: RefCell<HashMap<String, TransactionRecord>>,
}

impl TransactionProjectionStore for MemoryTransactionStore {
    fn clear(&self) -> Result<(), CoreError> {
        self.records.borrow_mut().clear();
        Ok(())
    }

    fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, CoreError> {
        Ok(self.records.borrow().get(transaction_id).cloned())
    }

    fn upsert(&self, record: &TransactionRecord) -> Result<(), CoreError> {
        self.records
            .borrow_mut()
            .insert(record.transaction_id.clone(), record.clone());
        Ok(())
    }

    fn get_all(&self, include_duplicates: bool) -> Result<Vec<TransactionRecord>, CoreError> {
        let mut records: Vec<_> = self
            .records
            .borrow()
            .values()
            .filter(|r| include_duplicates || !r.is_duplicate)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            (a.transaction_date, &a.account_id, &a.transaction_id)
                .cmp(&(b.transaction_date, &b.account_id, &b.transaction_id))
        });
        Ok(records)
    }
}

#[derive(Default)]
struct MemoryBudgetStore {
    records: RefCell<HashMap<String, BudgetRecord>>,
}

impl BudgetProjectionStore for MemoryBudgetStore {
    fn clear(&self) -> Result<(), CoreError> {
        self.records.borrow_mut().clear();
        Ok(())
    }

    fn get(&self, budget_id: &str) -> Result<Option<BudgetRecord>, CoreError> {
        Ok(self.records.borrow().get(budget_id).cloned())
    }

    fn upsert(&self, record: &BudgetRecord) -> Result<(), CoreError> {
        self.records
            .borrow_mut()
            .insert(record.budget_id.clone(), record.clone());
        Ok(())
    }

    fn get_active(&self) -> Result<Vec<BudgetRecord>, CoreError> {
        Ok(self
            .records
            .borrow()
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MemoryMetadataStore {
    last_sequence: RefCell<u64>,
}

impl ProjectionMetadataStore for MemoryMetadataStore {
    fn get_last_sequence(&self) -> Result<u64, CoreError> {
        Ok(*self.last_sequence.borrow())
    }

    fn set_last_sequence(&self, sequence: u64) -> Result<(), CoreError> {
        *self.last_sequence.borrow_mut() = sequence;
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.last_sequence.borrow_mut() = 0;
        Ok(())
    }
}

struct StubOracle {
    verdict: Assessment,
}

impl Classifier for StubOracle {
    fn train(&mut self, _pairs: &[(TransactionPair, bool)]) -> Result<TrainingMetrics, CoreError> {
        unreachable!("oracle is never trained")
    }

    fn predict(&self, _pair: &TransactionPair) -> Result<Assessment, CoreError> {
        Ok(self.verdict.clone())
    }

    fn is_trained(&self) -> bool {
        true
    }
}

fn import_event(
    transaction_id: &str,
    date: &str,
    account: &str,
    amount: rust_decimal::Decimal,
    description: &str,
) -> Event {
    let payload = ledger_domain::event::EventPayload::TransactionImported(
        ledger_domain::event::TransactionImported {
            transaction_id: transaction_id.to_string(),
            date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            source_file: "statement.csv".to_string(),
            source_account: account.to_string(),
            raw_description: description.to_string(),
            amount,
            currency: "CAD".to_string(),
            raw_data: HashMap::new(),
        },
    );
    Event::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(), payload)
}

/// Scenario 1 from the testable-properties section: two same-day,
/// same-amount rows with different descriptions; user picks "use latest".
#[test]
fn scenario_one_spotify_dedup() {
    let event_log = MemoryEventLog::default();
    let transactions = MemoryTransactionStore::default();
    let budgets = MemoryBudgetStore::default();
    let metadata = MemoryMetadataStore::default();

    event_log
        .append(&import_event("a", "2025-03-01", "acct-1", dec!(12.34), "SPOTIFY PREMIUM"))
        .unwrap();
    event_log
        .append(&import_event("b", "2025-03-01", "acct-1", dec!(12.34), "PYMT SPOTIFY INC"))
        .unwrap();

    let builder = ProjectionBuilder::new(&event_log, &transactions, &budgets, &metadata);
    builder.rebuild_from_scratch().unwrap();

    let all = transactions.get_all(false).unwrap();
    let candidates = find_candidate_pairs(&all, DetectionParams::default());
    let resolved = ledger_core::resolved_pairs(&event_log).unwrap();
    let candidates = suppress_resolved(candidates, &resolved);
    assert_eq!(candidates.len(), 1);

    let oracle = StubOracle {
        verdict: Assessment {
            is_duplicate: true,
            confidence: 0.92,
            reasoning: "same date/account/amount, similar description".to_string(),
        },
    };

    let review = ReviewWorkflowService::new(&event_log);
    let now = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
    let suggestion_id = review
        .create_suggestion_event(&candidates[0], &oracle.predict(&candidates[0]).unwrap(), "oracle", "v1", now)
        .unwrap();

    review
        .process_decision(
            &ReviewDecision {
                choice: ReviewChoice::UseLatest,
                rationale: None,
            },
            &candidates[0],
            &oracle.predict(&candidates[0]).unwrap(),
            suggestion_id,
            now,
        )
        .unwrap();

    builder.rebuild_incremental().unwrap();

    let primary = transactions.get("a").unwrap().unwrap();
    assert!(!primary.is_duplicate);
    assert_eq!(primary.canonical_description, "PYMT SPOTIFY INC");

    let duplicate = transactions.get("b").unwrap().unwrap();
    assert!(duplicate.is_duplicate);
    assert_eq!(duplicate.primary_transaction_id.as_deref(), Some("a"));

    let resolved_after = ledger_core::resolved_pairs(&event_log).unwrap();
    assert_eq!(resolved_after.len(), 1);
}

#[test]
fn rebuild_from_scratch_is_idempotent_on_reimport() {
    let event_log = MemoryEventLog::default();
    let transactions = MemoryTransactionStore::default();
    let budgets = MemoryBudgetStore::default();
    let metadata = MemoryMetadataStore::default();

    let event = import_event("a", "2025-03-01", "acct-1", dec!(5.00), "COFFEE");
    event_log.append(&event).unwrap();
    event_log.append(&event).unwrap();

    let builder = ProjectionBuilder::new(&event_log, &transactions, &budgets, &metadata);
    builder.rebuild_from_scratch().unwrap();

    let record = transactions.get("a").unwrap().unwrap();
    assert_eq!(record.description_history, vec!["COFFEE".to_string()]);
}

#[test]
fn rejected_pair_is_suppressed_on_rescan() {
    let event_log = MemoryEventLog::default();
    let transactions = MemoryTransactionStore::default();
    let budgets = MemoryBudgetStore::default();
    let metadata = MemoryMetadataStore::default();

    event_log
        .append(&import_event("a", "2025-03-01", "acct-1", dec!(10.00), "X"))
        .unwrap();
    event_log
        .append(&import_event("b", "2025-03-01", "acct-1", dec!(10.00), "Y"))
        .unwrap();

    let builder = ProjectionBuilder::new(&event_log, &transactions, &budgets, &metadata);
    builder.rebuild_from_scratch().unwrap();

    let all = transactions.get_all(false).unwrap();
    let candidates = find_candidate_pairs(&all, DetectionParams::default());
    assert_eq!(candidates.len(), 1);

    let assessment = Assessment {
        is_duplicate: false,
        confidence: 0.2,
        reasoning: "different accounts, unlikely".to_string(),
    };
    let review = ReviewWorkflowService::new(&event_log);
    let now = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
    let suggestion_id = review
        .create_suggestion_event(&candidates[0], &assessment, "oracle", "v1", now)
        .unwrap();
    review
        .process_decision(
            &ReviewDecision {
                choice: ReviewChoice::NotADuplicate,
                rationale: Some("different purchases".to_string()),
            },
            &candidates[0],
            &assessment,
            suggestion_id,
            now,
        )
        .unwrap();

    let resolved = ledger_core::resolved_pairs(&event_log).unwrap();
    let remaining = suppress_resolved(
        find_candidate_pairs(&transactions.get_all(false).unwrap(), DetectionParams::default()),
        &resolved,
    );
    assert!(remaining.is_empty());
}
