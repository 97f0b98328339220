//! The event log boundary.
//!
//! The log is an ordered, append-only, immutable sequence of domain events,
//! keyed by emitting address and a monotonically increasing position. The
//! external ledger serializes all writers; the core only needs to append
//! atomically and to consume the resulting total order faithfully.

use crate::errors::EventLogResult;
use crate::event::{DomainEvent, RecordedEvent};
use crate::types::{Address, LogPosition};
use async_trait::async_trait;

/// Port interface over the append-only ledger.
///
/// Implementations must assign strictly increasing positions across all
/// sources and must never mutate an appended event.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends a batch of events from one source atomically.
    ///
    /// All events in the batch receive consecutive positions with no
    /// interleaving from other writers; either the whole batch is appended
    /// or none of it is. Returns the position of the last appended event.
    ///
    /// # Errors
    /// Returns [`crate::EventLogError::EmptyBatch`] if `events` is empty
    /// (there is no last position to return), and
    /// [`crate::EventLogError::StoreFailure`] if the underlying storage
    /// fails; in either case nothing was appended.
    async fn append(
        &self,
        source: Address,
        events: Vec<DomainEvent>,
    ) -> EventLogResult<LogPosition>;

    /// Reads the entire log in position order.
    async fn read_all(&self) -> EventLogResult<Vec<RecordedEvent>>;

    /// Reads all events with a position strictly greater than `position`,
    /// in position order. This is the resume path for checkpointed
    /// consumers.
    async fn read_after(&self, position: LogPosition) -> EventLogResult<Vec<RecordedEvent>>;
}
