//! Aggregate abstraction.

use std::any::Any;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::command::Command;
use crate::context::Context;
use crate::error::DomainError;
use crate::event::{AggregateType, Event, EventType};

/// A domain object whose state is derived by replaying its event stream.
///
/// Aggregates are constructed fresh for every load and discarded after use.
/// Command handling never mutates state directly: it buffers new events,
/// which become state once they are committed and replayed.
pub trait Aggregate: Send + Sync + std::fmt::Debug {
    /// Returns the aggregate type.
    fn aggregate_type(&self) -> &AggregateType;

    /// Returns the aggregate identifier.
    fn entity_id(&self) -> Uuid;

    /// Returns the committed version (number of events applied).
    fn version(&self) -> i64;

    /// Advances the committed version by one.
    fn increment_version(&mut self);

    /// Apply a historical event to mutate internal state.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be applied to the current state.
    fn apply_event(&mut self, event: &Event) -> Result<(), DomainError>;

    /// Decides on a command, buffering zero or more new events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the command is rejected.
    fn handle_command(&mut self, ctx: &Context, command: &dyn Command) -> Result<(), DomainError>;

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Allows callers to downcast to the concrete aggregate.
    fn as_any(&self) -> &dyn Any;
}

/// Identity, version and event buffer shared by most aggregates.
///
/// Domain aggregates embed an `AggregateBase` and delegate the
/// bookkeeping methods of [`Aggregate`] to it.
#[derive(Debug, Clone)]
pub struct AggregateBase {
    id: Uuid,
    aggregate_type: AggregateType,
    version: i64,
    uncommitted_events: Vec<Event>,
}

impl AggregateBase {
    /// Creates the base of a new, empty aggregate.
    #[must_use]
    pub fn new(aggregate_type: AggregateType, id: Uuid) -> Self {
        Self {
            id,
            aggregate_type,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn entity_id(&self) -> Uuid {
        self.id
    }

    /// Returns the aggregate type.
    #[must_use]
    pub fn aggregate_type(&self) -> &AggregateType {
        &self.aggregate_type
    }

    /// Returns the committed version.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Advances the committed version by one.
    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    /// Returns uncommitted events.
    #[must_use]
    pub fn uncommitted_events(&self) -> &[Event] {
        &self.uncommitted_events
    }

    /// Clears uncommitted events.
    pub fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }

    /// Returns the version the next buffered event will carry.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn next_version(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    /// Buffers a new event for this aggregate and returns it.
    pub fn append_event(
        &mut self,
        event_type: EventType,
        payload: Value,
        occurred_at: DateTime<Utc>,
    ) -> &Event {
        let event = Event::new(
            event_type,
            self.aggregate_type.clone(),
            self.id,
            self.next_version(),
            occurred_at,
            payload,
        );
        self.uncommitted_events.push(event);
        &self.uncommitted_events[self.uncommitted_events.len() - 1]
    }
}
