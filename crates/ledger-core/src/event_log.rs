use ledger_domain::Event;

use crate::error::CoreError;

/// Append-only, sequenced storage of typed events. Implementations
/// (see `ledger-storage-sqlite`) guarantee that `append` either fully
/// succeeds or leaves the log unchanged, and that sequence numbers are
/// strictly increasing with no gaps.
pub trait EventLog {
    /// Appends an event, returning its assigned sequence number.
    fn append(&self, event: &Event) -> Result<u64, CoreError>;

    /// All events in sequence order.
    fn get_all(&self) -> Result<Vec<Event>, CoreError>;

    /// All events of a given discriminator, in sequence order.
    fn get_by_type(&self, event_type: &str) -> Result<Vec<Event>, CoreError>;

    /// All events whose aggregate matches, in sequence order.
    fn get_by_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<Event>, CoreError>;

    /// All events with sequence strictly greater than `sequence_number`,
    /// in sequence order.
    fn get_since(&self, sequence_number: u64) -> Result<Vec<Event>, CoreError>;

    /// The current maximum sequence number, or 0 if the log is empty.
    fn latest_sequence(&self) -> Result<u64, CoreError>;
}
