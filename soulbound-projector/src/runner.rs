//! Driving a projector against a live log.
//!
//! The runner reads the log, feeds each recorded event to the projector,
//! and persists a checkpoint so a restart resumes after the last applied
//! position instead of replaying from the beginning.

use crate::projector::Projector;
use soulbound::{EventLog, EventLogError, LogPosition};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while driving a projection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The event log could not be read.
    #[error("projection read failed: {0}")]
    Read(#[from] EventLogError),

    /// The checkpoint store failed.
    #[error("checkpoint store failure during {operation}")]
    Checkpoint {
        /// The operation that observed the failure.
        operation: &'static str,
    },
}

/// Result type for projection runner operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// How the runner consumes the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Process everything currently in the log, then return.
    Batch,
    /// Keep polling for new events until the task is cancelled.
    Continuous,
}

/// Keeps the last applied position per projection name.
///
/// Clones share storage, so a runner restarted with a clone of the store
/// resumes where its predecessor stopped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    positions: Arc<Mutex<HashMap<String, LogPosition>>>,
}

impl InMemoryCheckpointStore {
    /// Creates an empty checkpoint store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the checkpoint for a projection, if one was saved.
    pub fn load(&self, name: &str) -> ProjectionResult<Option<LogPosition>> {
        self.positions
            .lock()
            .map(|guard| guard.get(name).copied())
            .map_err(|_| ProjectionError::Checkpoint { operation: "load" })
    }

    /// Saves the checkpoint for a projection, overwriting any previous one.
    pub fn save(&self, name: &str, position: LogPosition) -> ProjectionResult<()> {
        self.positions
            .lock()
            .map(|mut guard| {
                guard.insert(name.to_string(), position);
            })
            .map_err(|_| ProjectionError::Checkpoint { operation: "save" })
    }
}

/// Drives a [`Projector`] over an [`EventLog`].
pub struct ProjectionRunner<L: EventLog> {
    name: String,
    projector: Projector,
    log: Arc<L>,
    checkpoints: Option<InMemoryCheckpointStore>,
    poll_mode: PollMode,
    poll_interval: Duration,
}

impl<L: EventLog> ProjectionRunner<L> {
    /// Creates a batch-mode runner with no checkpointing.
    pub fn new(name: impl Into<String>, projector: Projector, log: Arc<L>) -> Self {
        Self {
            name: name.into(),
            projector,
            log,
            checkpoints: None,
            poll_mode: PollMode::Batch,
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Enables checkpointing through the given store.
    #[must_use]
    pub fn with_checkpoint_store(mut self, store: InMemoryCheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Sets the poll mode.
    #[must_use]
    pub const fn with_poll_mode(mut self, mode: PollMode) -> Self {
        self.poll_mode = mode;
        self
    }

    /// Sets the interval between polls in continuous mode.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The projector, including its derived model.
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Runs the projection.
    ///
    /// In [`PollMode::Batch`] this applies everything after the current
    /// checkpoint and returns. In [`PollMode::Continuous`] it keeps polling
    /// until the surrounding task is cancelled.
    ///
    /// # Errors
    /// Returns [`ProjectionError`] if the log or checkpoint store fails;
    /// the checkpoint only advances past events already handed to the
    /// projector. Events the projector's registry defers stay buffered in
    /// the projector itself, so they are not lost to the advancing
    /// checkpoint — but they are in-memory state, not durably applied.
    pub async fn run(&mut self) -> ProjectionResult<()> {
        info!(projection = %self.name, mode = ?self.poll_mode, "starting projection");
        loop {
            let applied = self.run_once().await?;
            if applied > 0 {
                debug!(projection = %self.name, applied, "applied events");
            }
            match self.poll_mode {
                PollMode::Batch => return Ok(()),
                PollMode::Continuous => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    /// Feeds every event after the current checkpoint to the projector
    /// and advances the checkpoint past them. Returns how many events
    /// were read; deferred events count as read, not as applied.
    pub async fn run_once(&mut self) -> ProjectionResult<usize> {
        let checkpoint = match &self.checkpoints {
            Some(store) => store.load(&self.name)?,
            None => None,
        };
        let events = match checkpoint {
            Some(position) => self.log.read_after(position).await?,
            None => self.log.read_all().await?,
        };

        let mut last = None;
        for event in &events {
            self.projector.apply(event);
            last = Some(event.position);
        }
        if let (Some(store), Some(position)) = (&self.checkpoints, last) {
            store.save(&self.name, position)?;
        }
        Ok(events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_store_loads_what_was_saved() {
        let store = InMemoryCheckpointStore::new();
        assert_eq!(store.load("tokens").unwrap(), None);

        store.save("tokens", LogPosition::new(7)).unwrap();
        assert_eq!(store.load("tokens").unwrap(), Some(LogPosition::new(7)));

        // Other projections keep their own checkpoints.
        assert_eq!(store.load("collections").unwrap(), None);
    }

    #[test]
    fn checkpoint_store_clones_share_state() {
        let store = InMemoryCheckpointStore::new();
        let clone = store.clone();
        store.save("tokens", LogPosition::new(3)).unwrap();
        assert_eq!(clone.load("tokens").unwrap(), Some(LogPosition::new(3)));
    }
}
