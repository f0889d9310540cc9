//! Mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::store::EventStore;
use uuid::Uuid;

/// An event store that returns a fixed history from `load` and records
/// every `save` call without persisting it.
#[derive(Debug)]
pub struct RecordingEventStore {
    history: Vec<Event>,
    saved: Mutex<Vec<(Vec<Event>, i64)>>,
}

impl RecordingEventStore {
    /// Creates a store whose `load` returns `history`. An empty history
    /// loads as `AggregateNotFound`.
    #[must_use]
    pub fn new(history: Vec<Event>) -> Self {
        Self {
            history,
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Returns every saved batch with its original version.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved(&self) -> Vec<(Vec<Event>, i64)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn load(&self, _ctx: &Context, aggregate_id: Uuid) -> Result<Vec<Event>, DomainError> {
        if self.history.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        Ok(self.history.clone())
    }

    async fn save(
        &self,
        _ctx: &Context,
        events: &[Event],
        original_version: i64,
    ) -> Result<(), DomainError> {
        self.saved
            .lock()
            .unwrap()
            .push((events.to_vec(), original_version));
        Ok(())
    }
}

/// An event store that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn load(&self, _ctx: &Context, _aggregate_id: Uuid) -> Result<Vec<Event>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save(
        &self,
        _ctx: &Context,
        _events: &[Event],
        _original_version: i64,
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
