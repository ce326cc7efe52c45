use ledger_domain::event::{EventPayload, TransactionPair};

use crate::error::CoreError;
use crate::event_log::EventLog;

/// Builds labeled `(pair, is_duplicate)` training examples from
/// `DuplicateConfirmed`/`DuplicateRejected` events. Stays strictly
/// within the event → training-example projection; no feature
/// engineering or model code lives here.
pub fn training_pairs<L: EventLog>(event_log: &L) -> Result<Vec<(TransactionPair, bool)>, CoreError> {
    let mut pairs = Vec::new();
    for event in event_log.get_all()? {
        match &event.payload {
            EventPayload::DuplicateSuggested(suggested) => {
                let label = resolution_for(event_log, &suggested.transaction_id_1, &suggested.transaction_id_2)?;
                if let Some(is_duplicate) = label {
                    pairs.push((suggested.assessment.pair.clone(), is_duplicate));
                }
            }
            _ => continue,
        }
    }
    Ok(pairs)
}

fn resolution_for<L: EventLog>(
    event_log: &L,
    id1: &str,
    id2: &str,
) -> Result<Option<bool>, CoreError> {
    for event in event_log.get_all()? {
        match &event.payload {
            EventPayload::DuplicateConfirmed(c)
                if (c.primary_transaction_id == id1 && c.duplicate_transaction_id == id2)
                    || (c.primary_transaction_id == id2 && c.duplicate_transaction_id == id1) =>
            {
                return Ok(Some(true));
            }
            EventPayload::DuplicateRejected(r)
                if (r.transaction_id_1 == id1 && r.transaction_id_2 == id2)
                    || (r.transaction_id_1 == id2 && r.transaction_id_2 == id1) =>
            {
                return Ok(Some(false));
            }
            _ => continue,
        }
    }
    Ok(None)
}
