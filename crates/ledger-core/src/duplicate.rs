use std::collections::HashSet;

use ledger_domain::event::{Assessment, EventPayload, TransactionPair, TransactionSnapshot};
use ledger_domain::TransactionRecord;
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::event_log::EventLog;

/// Minimum number of labeled pairs required before a trained classifier
/// is trusted over the oracle fallback.
pub const MIN_TRAINING_EXAMPLES: usize = 10;

/// An interchangeable capability for assessing whether a candidate pair
/// is a true duplicate. The trained ML classifier and the LLM-backed
/// oracle are both implementations of this trait; the detector treats
/// them identically.
pub trait Classifier {
    /// Trains on labeled pairs, returning summary metrics. Implementations
    /// must fail with `CoreError::InsufficientTrainingData` when fewer
    /// than `MIN_TRAINING_EXAMPLES` pairs are supplied.
    fn train(&mut self, pairs: &[(TransactionPair, bool)]) -> Result<TrainingMetrics, CoreError>;

    /// Predicts whether a candidate pair is a duplicate. Implementations
    /// must fail with `CoreError::UntrainedModel` if called before a
    /// successful `train`.
    fn predict(&self, pair: &TransactionPair) -> Result<Assessment, CoreError>;

    /// Whether this classifier has been trained and is ready to predict.
    fn is_trained(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingMetrics {
    pub train_accuracy: f64,
    pub validation_accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub train_examples: usize,
    pub validation_examples: usize,
}

/// Candidate generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct DetectionParams {
    pub max_days_apart: i64,
    pub amount_tolerance: Decimal,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            max_days_apart: 1,
            amount_tolerance: Decimal::new(1, 3), // 0.001
        }
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Reads all `DuplicateConfirmed`/`DuplicateRejected` events and forms
/// the set of already-resolved `{id1, id2}` pair keys, so interrupted
/// sessions resume without re-showing the same candidate twice.
pub fn resolved_pairs<L: EventLog>(event_log: &L) -> Result<HashSet<(String, String)>, CoreError> {
    let mut resolved = HashSet::new();
    for event in event_log.get_all()? {
        match &event.payload {
            EventPayload::DuplicateConfirmed(p) => {
                resolved.insert(pair_key(&p.primary_transaction_id, &p.duplicate_transaction_id));
            }
            EventPayload::DuplicateRejected(p) => {
                resolved.insert(pair_key(&p.transaction_id_1, &p.transaction_id_2));
            }
            _ => {}
        }
    }
    Ok(resolved)
}

fn to_snapshot(record: &TransactionRecord) -> TransactionSnapshot {
    TransactionSnapshot {
        transaction_id: record.transaction_id.clone(),
        date: record.transaction_date,
        account_id: record.account_id.clone(),
        amount: record.amount,
        description: record.canonical_description.clone(),
    }
}

/// Enumerates candidate duplicate pairs from a date-sorted, non-duplicate
/// transaction set. `transactions` must already be sorted by
/// `(transaction_date, account_id, transaction_id)`; callers get this for
/// free from `TransactionProjectionStore::get_all(false)`.
///
/// Mirrors the heuristic pre-filter exactly: the inner loop **breaks**
/// (not skips) once the date window is exceeded, relying on sort order.
pub fn find_candidate_pairs(
    transactions: &[TransactionRecord],
    params: DetectionParams,
) -> Vec<TransactionPair> {
    let mut candidates = Vec::new();
    for (i, t1) in transactions.iter().enumerate() {
        for t2 in &transactions[i + 1..] {
            let date_diff = (t2.transaction_date - t1.transaction_date).num_days().abs();
            if date_diff > params.max_days_apart {
                break;
            }
            if t1.account_id != t2.account_id {
                continue;
            }
            let amount_diff = (t2.amount - t1.amount).abs();
            if amount_diff > params.amount_tolerance {
                continue;
            }
            if t1.canonical_description == t2.canonical_description {
                continue;
            }
            candidates.push(TransactionPair {
                txn1: to_snapshot(t1),
                txn2: to_snapshot(t2),
            });
        }
    }
    candidates
}

/// Filters candidates against already-resolved pairs.
pub fn suppress_resolved(
    candidates: Vec<TransactionPair>,
    resolved: &HashSet<(String, String)>,
) -> Vec<TransactionPair> {
    candidates
        .into_iter()
        .filter(|pair| !resolved.contains(&pair_key(pair.txn1_id(), pair.txn2_id())))
        .collect()
}

#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub pair: TransactionPair,
    pub assessment: Assessment,
}

/// Assesses every supplied candidate with `classifier` if trained and
/// enough labeled examples exist, else falls back to `oracle`, then sorts
/// matches by confidence descending.
pub fn scan_transactions(
    candidates: Vec<TransactionPair>,
    classifier: Option<&dyn Classifier>,
    oracle: &dyn Classifier,
) -> Result<Vec<DuplicateMatch>, CoreError> {
    let mut matches = Vec::with_capacity(candidates.len());
    for pair in candidates {
        let assessment = match classifier.filter(|c| c.is_trained()) {
            Some(c) => c.predict(&pair)?,
            None => oracle.predict(&pair)?,
        };
        matches.push(DuplicateMatch { pair, assessment });
    }
    matches.sort_by(|a, b| {
        b.assessment
            .confidence
            .partial_cmp(&a.assessment.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(matches)
}
