//! In-memory implementation of the soulbound `EventLog`.
//!
//! This crate provides [`InMemoryEventLog`], a thread-safe, totally ordered
//! append-only log suitable for testing and development. Positions are
//! assigned globally across all sources, appends are atomic per batch, and
//! cloning the log shares the underlying storage so producers and consumers
//! can hold their own handles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use soulbound::{
    Address, DomainEvent, EventLog, EventLogError, EventLogResult, LogPosition, RecordedEvent,
    Timestamp,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Internal storage: the global ordered log plus a per-source index of
/// positions, maintained on every append.
#[derive(Debug, Default)]
struct LogData {
    events: Vec<RecordedEvent>,
    sources: HashMap<Address, Vec<u64>>,
}

/// A thread-safe in-memory event log.
///
/// Clones share storage, so one handle can append while another reads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    data: Arc<RwLock<LogData>>,
}

impl InMemoryEventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of events appended so far.
    pub fn len(&self) -> EventLogResult<usize> {
        self.data
            .read()
            .map(|data| data.events.len())
            .map_err(|_| EventLogError::StoreFailure { operation: "len" })
    }

    /// Returns whether the log is empty.
    pub fn is_empty(&self) -> EventLogResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads every event a single source has appended, in position order.
    pub fn read_source(&self, source: &Address) -> EventLogResult<Vec<RecordedEvent>> {
        let data = self.data.read().map_err(|_| EventLogError::StoreFailure {
            operation: "read_source",
        })?;
        Ok(data
            .sources
            .get(source)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&idx| data.events[idx as usize].clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(
        &self,
        source: Address,
        events: Vec<DomainEvent>,
    ) -> EventLogResult<LogPosition> {
        if events.is_empty() {
            return Err(EventLogError::EmptyBatch);
        }
        let mut data = self
            .data
            .write()
            .map_err(|_| EventLogError::StoreFailure { operation: "append" })?;

        let mut last = LogPosition::new(data.events.len() as u64);
        let timestamp = Timestamp::now();
        for payload in events {
            let index = data.events.len() as u64;
            last = LogPosition::new(index);
            data.events.push(RecordedEvent {
                position: last,
                source: source.clone(),
                timestamp,
                payload,
            });
            data.sources.entry(source.clone()).or_default().push(index);
        }
        Ok(last)
    }

    async fn read_all(&self) -> EventLogResult<Vec<RecordedEvent>> {
        self.data
            .read()
            .map(|data| data.events.clone())
            .map_err(|_| EventLogError::StoreFailure {
                operation: "read_all",
            })
    }

    async fn read_after(&self, position: LogPosition) -> EventLogResult<Vec<RecordedEvent>> {
        let data = self.data.read().map_err(|_| EventLogError::StoreFailure {
            operation: "read_after",
        })?;
        Ok(data
            .events
            .iter()
            .filter(|event| event.position > position)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbound::event::{Issued, Locked};
    use soulbound::{BurnAuth, TokenId};
    use tokio_test::assert_ok;

    fn issued(issuer: &Address, holder: &Address, id: u64) -> DomainEvent {
        DomainEvent::from(Issued {
            issuer: issuer.clone(),
            holder: holder.clone(),
            token_id: TokenId::new(id),
            burn_auth: BurnAuth::IssuerOnly,
        })
    }

    #[tokio::test]
    async fn new_log_is_empty() {
        let log = InMemoryEventLog::new();
        assert!(tokio_test::assert_ok!(log.is_empty()));
        assert!(tokio_test::assert_ok!(log.read_all().await).is_empty());
    }

    #[tokio::test]
    async fn append_assigns_sequential_positions_across_sources() {
        let log = InMemoryEventLog::new();
        let a = Address::generate();
        let b = Address::generate();
        let holder = Address::generate();

        let first = log
            .append(a.clone(), vec![issued(&a, &holder, 0)])
            .await
            .unwrap();
        let second = log
            .append(b.clone(), vec![issued(&b, &holder, 0)])
            .await
            .unwrap();
        let third = log
            .append(a.clone(), vec![issued(&a, &holder, 1)])
            .await
            .unwrap();

        assert_eq!(u64::from(first), 0);
        assert_eq!(u64::from(second), 1);
        assert_eq!(u64::from(third), 2);

        let all = log.read_all().await.unwrap();
        assert_eq!(all.len(), 3);
        for (idx, event) in all.iter().enumerate() {
            assert_eq!(u64::from(event.position), idx as u64);
        }
    }

    #[tokio::test]
    async fn empty_batch_append_is_rejected_without_effect() {
        let log = InMemoryEventLog::new();
        let result = log.append(Address::generate(), Vec::new()).await;
        assert_eq!(result, Err(EventLogError::EmptyBatch));
        assert!(log.is_empty().unwrap());
    }

    #[tokio::test]
    async fn batch_append_is_contiguous_and_returns_last_position() {
        let log = InMemoryEventLog::new();
        let source = Address::generate();
        let holder = Address::generate();

        let batch = vec![
            issued(&source, &holder, 0),
            DomainEvent::from(Locked {
                token_id: TokenId::new(0),
            }),
            issued(&source, &Address::generate(), 1),
        ];
        let last = log.append(source.clone(), batch).await.unwrap();
        assert_eq!(u64::from(last), 2);

        let all = log.read_all().await.unwrap();
        assert_eq!(
            all.iter().map(|e| e.payload.kind()).collect::<Vec<_>>(),
            vec!["Issued", "Locked", "Issued"]
        );
    }

    #[tokio::test]
    async fn read_after_returns_strictly_later_events() {
        let log = InMemoryEventLog::new();
        let source = Address::generate();
        let holder = Address::generate();
        for id in 0..4 {
            log.append(source.clone(), vec![issued(&source, &holder, id)])
                .await
                .unwrap();
        }

        let tail = log.read_after(LogPosition::new(1)).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(u64::from(tail[0].position), 2);
        assert_eq!(u64::from(tail[1].position), 3);

        let nothing = log.read_after(LogPosition::new(3)).await.unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn read_source_filters_by_emitter() {
        let log = InMemoryEventLog::new();
        let a = Address::generate();
        let b = Address::generate();
        let holder = Address::generate();

        log.append(a.clone(), vec![issued(&a, &holder, 0)])
            .await
            .unwrap();
        log.append(b.clone(), vec![issued(&b, &holder, 0)])
            .await
            .unwrap();
        log.append(a.clone(), vec![issued(&a, &holder, 1)])
            .await
            .unwrap();

        let from_a = log.read_source(&a).unwrap();
        assert_eq!(from_a.len(), 2);
        assert!(from_a.iter().all(|e| e.source == a));
        assert!(log.read_source(&Address::generate()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_same_storage() {
        let log = InMemoryEventLog::new();
        let clone = log.clone();
        let source = Address::generate();

        log.append(source.clone(), vec![issued(&source, &Address::generate(), 0)])
            .await
            .unwrap();

        assert_eq!(clone.len().unwrap(), 1);
        assert!(Arc::ptr_eq(&log.data, &clone.data));
    }
}
