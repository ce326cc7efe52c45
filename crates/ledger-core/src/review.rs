use chrono::{DateTime, Utc};
use ledger_domain::event::{
    Assessment, DuplicateConfirmed, DuplicateRejected, EventPayload, SuggestionAssessment,
    TransactionPair,
};
use ledger_domain::Event;
use uuid::Uuid;

use crate::duplicate::DuplicateMatch;
use crate::error::CoreError;
use crate::event_log::EventLog;

/// The user's choice when reviewing a suggested duplicate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    /// Keep the pair, preferring the second (latest) transaction's description.
    UseLatest,
    /// Keep the pair, preferring the first (original) transaction's description.
    UseOriginal,
    /// The pair is not a duplicate.
    NotADuplicate,
}

#[derive(Debug, Clone)]
pub struct ReviewDecision {
    pub choice: ReviewChoice,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewSummary {
    pub total_matches: usize,
    pub oracle_predicted_duplicates: usize,
    pub oracle_predicted_not_duplicates: usize,
    pub user_confirmed: usize,
    pub user_rejected: usize,
    pub feedback_count: usize,
}

/// Pure transformation of user decisions into correctly-typed events.
/// Contains no I/O beyond the event log handed to it; isolates business
/// rules from any UI.
pub struct ReviewWorkflowService<'a, L> {
    event_log: &'a L,
}

impl<'a, L: EventLog> ReviewWorkflowService<'a, L> {
    pub fn new(event_log: &'a L) -> Self {
        Self { event_log }
    }

    /// Appends a `DuplicateSuggested` event with the exact schema: the
    /// embedded assessment carries only `is_duplicate`, `confidence`,
    /// `reasoning`, and the full pair — never derived booleans.
    pub fn create_suggestion_event(
        &self,
        pair: &TransactionPair,
        assessment: &Assessment,
        model: &str,
        prompt_version: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        if !(0.0..=1.0).contains(&assessment.confidence) {
            return Err(CoreError::Validation(format!(
                "confidence {} outside [0, 1]",
                assessment.confidence
            )));
        }
        let payload = EventPayload::DuplicateSuggested(ledger_domain::event::DuplicateSuggested {
            transaction_id_1: pair.txn1_id().to_string(),
            transaction_id_2: pair.txn2_id().to_string(),
            confidence: assessment.confidence,
            reasoning: assessment.reasoning.clone(),
            model: model.to_string(),
            prompt_version: prompt_version.to_string(),
            assessment: SuggestionAssessment::new(assessment.clone(), pair.clone()),
        });
        let event = Event::new(now, payload);
        let event_id = event.event_id;
        self.event_log
            .append(&event)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(event_id)
    }

    /// Translates a decision into a `DuplicateConfirmed` or
    /// `DuplicateRejected` event and appends it.
    ///
    /// `llm_was_correct` is set by comparing the oracle's `is_duplicate`
    /// to the user's choice: true for a confirm iff the oracle predicted
    /// a duplicate, true for a reject iff the oracle predicted it was
    /// *not* a duplicate.
    pub fn process_decision(
        &self,
        decision: &ReviewDecision,
        pair: &TransactionPair,
        assessment: &Assessment,
        suggestion_event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, CoreError> {
        let payload = match decision.choice {
            ReviewChoice::NotADuplicate => EventPayload::DuplicateRejected(DuplicateRejected {
                suggestion_event_id,
                transaction_id_1: pair.txn1_id().to_string(),
                transaction_id_2: pair.txn2_id().to_string(),
                user_rationale: decision.rationale.clone(),
                llm_was_correct: !assessment.is_duplicate,
            }),
            ReviewChoice::UseLatest | ReviewChoice::UseOriginal => {
                let canonical_description = match decision.choice {
                    ReviewChoice::UseLatest => pair.txn2_description().to_string(),
                    _ => pair.txn1_description().to_string(),
                };
                EventPayload::DuplicateConfirmed(DuplicateConfirmed {
                    suggestion_event_id,
                    primary_transaction_id: pair.txn1_id().to_string(),
                    duplicate_transaction_id: pair.txn2_id().to_string(),
                    canonical_description,
                    user_rationale: decision.rationale.clone(),
                    llm_was_correct: assessment.is_duplicate,
                })
            }
        };
        let event = Event::new(now, payload);
        self.event_log
            .append(&event)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(event)
    }

    /// Inspects learned-pattern strings for phrases indicating a user
    /// preference, returning a default choice and hint text.
    pub fn smart_default(learned_patterns: &[String]) -> (ReviewChoice, String) {
        for pattern in learned_patterns {
            if pattern.contains("User prefers latest") {
                let hint = extract_percentage_hint(pattern, "latest");
                return (ReviewChoice::UseLatest, hint);
            }
            if pattern.contains("User prefers original") {
                let hint = extract_percentage_hint(pattern, "original");
                return (ReviewChoice::UseOriginal, hint);
            }
        }
        (ReviewChoice::UseLatest, String::new())
    }

    /// Counts total matches, oracle-predicted duplicates vs
    /// non-duplicates, user-confirmed, user-rejected, and feedback volume.
    pub fn build_summary(matches: &[DuplicateMatch], feedback: &[ReviewChoice]) -> ReviewSummary {
        let oracle_predicted_duplicates =
            matches.iter().filter(|m| m.assessment.is_duplicate).count();
        let user_confirmed = feedback
            .iter()
            .filter(|c| matches!(c, ReviewChoice::UseLatest | ReviewChoice::UseOriginal))
            .count();
        let user_rejected = feedback
            .iter()
            .filter(|c| matches!(c, ReviewChoice::NotADuplicate))
            .count();
        ReviewSummary {
            total_matches: matches.len(),
            oracle_predicted_duplicates,
            oracle_predicted_not_duplicates: matches.len() - oracle_predicted_duplicates,
            user_confirmed,
            user_rejected,
            feedback_count: feedback.len(),
        }
    }
}

fn extract_percentage_hint(pattern: &str, preference: &str) -> String {
    let digits: String = pattern
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        format!("learned: prefers {preference}")
    } else {
        format!("learned: {digits}% prefer {preference}")
    }
}
