//! Dynamic source discovery.
//!
//! The projector starts knowing only the factory's address. Issuance
//! instances are discovered at runtime from the factory's creation events,
//! so an event from a source that is not yet tracked cannot simply be
//! dropped: the log is totally ordered but the projector may encounter an
//! instance's events before it has processed the creation event that
//! legitimizes them (for example when replaying a filtered slice). Such
//! events are buffered per source and drained, in order, the moment the
//! source becomes tracked.

use soulbound::{Address, RecordedEvent};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Routing verdict for a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The source is known; apply the event now.
    Apply(RecordedEvent),
    /// The source is unknown; the event was buffered for later.
    Deferred,
}

/// Tracks which addresses are legitimate event sources.
///
/// The factory is tracked from construction; instances join when their
/// creation event is observed.
#[derive(Debug, Clone)]
pub struct SubscriptionManager {
    factory: Address,
    tracked: HashSet<Address>,
    pending: HashMap<Address, Vec<RecordedEvent>>,
}

impl SubscriptionManager {
    /// Creates a manager tracking only the factory.
    pub fn new(factory: Address) -> Self {
        let mut tracked = HashSet::new();
        tracked.insert(factory.clone());
        Self {
            factory,
            tracked,
            pending: HashMap::new(),
        }
    }

    /// The factory address this manager was built for.
    pub fn factory(&self) -> &Address {
        &self.factory
    }

    /// Returns whether events from `source` are currently applied.
    pub fn is_tracked(&self, source: &Address) -> bool {
        self.tracked.contains(source)
    }

    /// Routes an event: applied if its source is tracked, buffered
    /// otherwise.
    pub fn route(&mut self, event: RecordedEvent) -> Route {
        if self.tracked.contains(&event.source) {
            Route::Apply(event)
        } else {
            debug!(source = %event.source, kind = event.payload.kind(), "deferring event from untracked source");
            self.pending.entry(event.source.clone()).or_default().push(event);
            Route::Deferred
        }
    }

    /// Starts tracking `source` and returns any events buffered for it, in
    /// arrival order. Idempotent; tracking an already tracked source drains
    /// nothing.
    pub fn track(&mut self, source: Address) -> Vec<RecordedEvent> {
        if !self.tracked.insert(source.clone()) {
            return Vec::new();
        }
        let drained = self.pending.remove(&source).unwrap_or_default();
        if !drained.is_empty() {
            debug!(%source, count = drained.len(), "draining deferred events for newly tracked source");
        }
        drained
    }

    /// Number of events currently buffered across all untracked sources.
    pub fn deferred_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbound::event::Locked;
    use soulbound::{DomainEvent, LogPosition, Timestamp, TokenId};

    fn event_from(source: &Address, position: u64) -> RecordedEvent {
        RecordedEvent {
            position: LogPosition::new(position),
            source: source.clone(),
            timestamp: Timestamp::now(),
            payload: DomainEvent::from(Locked {
                token_id: TokenId::new(0),
            }),
        }
    }

    #[test]
    fn factory_is_tracked_from_the_start() {
        let factory = Address::generate();
        let mut manager = SubscriptionManager::new(factory.clone());
        assert!(manager.is_tracked(&factory));
        assert!(matches!(
            manager.route(event_from(&factory, 0)),
            Route::Apply(_)
        ));
    }

    #[test]
    fn untracked_events_are_buffered_and_drained_in_order() {
        let mut manager = SubscriptionManager::new(Address::generate());
        let instance = Address::generate();

        assert_eq!(manager.route(event_from(&instance, 3)), Route::Deferred);
        assert_eq!(manager.route(event_from(&instance, 5)), Route::Deferred);
        assert_eq!(manager.deferred_count(), 2);

        let drained = manager.track(instance.clone());
        assert_eq!(drained.len(), 2);
        assert_eq!(u64::from(drained[0].position), 3);
        assert_eq!(u64::from(drained[1].position), 5);
        assert_eq!(manager.deferred_count(), 0);

        // Subsequent events apply directly.
        assert!(matches!(
            manager.route(event_from(&instance, 6)),
            Route::Apply(_)
        ));
    }

    #[test]
    fn tracking_twice_drains_nothing_extra() {
        let mut manager = SubscriptionManager::new(Address::generate());
        let instance = Address::generate();
        manager.route(event_from(&instance, 0));
        assert_eq!(manager.track(instance.clone()).len(), 1);
        assert!(manager.track(instance).is_empty());
    }
}
