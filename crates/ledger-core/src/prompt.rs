use ledger_domain::event::EventPayload;

use crate::error::CoreError;
use crate::event_log::EventLog;

/// Returns the latest prompt version and its learned patterns, read from
/// the most recent `PromptUpdated` event. Defaults to `("v1", [])` if
/// none has ever been appended.
pub fn learned_patterns_as_of<L: EventLog>(event_log: &L) -> Result<(String, Vec<String>), CoreError> {
    let mut latest: Option<(String, Vec<String>)> = None;
    for event in event_log.get_all()? {
        if let EventPayload::PromptUpdated(p) = &event.payload {
            latest = Some((p.prompt_version.clone(), p.learned_patterns.clone()));
        }
    }
    Ok(latest.unwrap_or_else(|| ("v1".to_string(), Vec::new())))
}
