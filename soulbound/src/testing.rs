//! Test support: a minimal capturing event log.
//!
//! `CapturingLog` records appended events in memory so unit tests can assert
//! exactly what a state machine emitted. For a full log with per-source
//! indexing use the `soulbound-memory` crate.

use crate::errors::{EventLogError, EventLogResult};
use crate::event::{DomainEvent, RecordedEvent};
use crate::event_log::EventLog;
use crate::types::{Address, LogPosition, Timestamp};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// An `EventLog` that appends into a shared in-memory vector.
#[derive(Debug, Clone, Default)]
pub struct CapturingLog {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl CapturingLog {
    /// Creates an empty capturing log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything appended so far, in order.
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns the kinds of all appended events, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.recorded().iter().map(|e| e.payload.kind()).collect()
    }

    /// Returns how many events were appended.
    pub fn len(&self) -> usize {
        self.events.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns whether nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventLog for CapturingLog {
    async fn append(
        &self,
        source: Address,
        events: Vec<DomainEvent>,
    ) -> EventLogResult<LogPosition> {
        if events.is_empty() {
            return Err(EventLogError::EmptyBatch);
        }
        let mut guard = self
            .events
            .lock()
            .map_err(|_| EventLogError::StoreFailure { operation: "append" })?;
        let mut position = LogPosition::new(guard.len() as u64);
        let mut last = position;
        for payload in events {
            last = position;
            guard.push(RecordedEvent {
                position,
                source: source.clone(),
                timestamp: Timestamp::now(),
                payload,
            });
            position = position.next();
        }
        Ok(last)
    }

    async fn read_all(&self) -> EventLogResult<Vec<RecordedEvent>> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| EventLogError::StoreFailure {
                operation: "read_all",
            })
    }

    async fn read_after(&self, position: LogPosition) -> EventLogResult<Vec<RecordedEvent>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|event| event.position > position)
            .collect())
    }
}
