use chrono::{DateTime, Utc};
use ledger_domain::event::{CategorizationRuleCreated, EventPayload};
use ledger_domain::Event;
use uuid::Uuid;

use crate::error::CoreError;
use crate::event_log::EventLog;

/// Appends `CategorizationRuleCreated` events. The projection builder
/// performs no state mutation for this event — it exists purely for
/// audit and for the categorization engine (out of scope here) to learn
/// from.
pub struct CategorizationRuleService;

impl CategorizationRuleService {
    pub fn create_rule<L: EventLog>(
        event_log: &L,
        rule_type: &str,
        pattern: &str,
        category: &str,
        subcategory: Option<String>,
        enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        if pattern.trim().is_empty() {
            return Err(CoreError::Validation("rule pattern must not be empty".into()));
        }
        if category.trim().is_empty() {
            return Err(CoreError::Validation("rule category must not be empty".into()));
        }
        if category.contains(':') {
            return Err(CoreError::Validation(format!("category name {category:?} must not contain ':'")));
        }
        if let Some(sub) = &subcategory {
            if sub.contains(':') {
                return Err(CoreError::Validation(format!("subcategory name {sub:?} must not contain ':'")));
            }
        }
        let rule_id = Uuid::new_v4();
        let payload = EventPayload::CategorizationRuleCreated(CategorizationRuleCreated {
            rule_id,
            rule_type: rule_type.to_string(),
            pattern: pattern.to_string(),
            category: category.to_string(),
            subcategory,
            enabled,
        });
        let event = Event::new(now, payload);
        event_log
            .append(&event)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok(rule_id)
    }
}
