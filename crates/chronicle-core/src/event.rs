//! Events and the clock that stamps them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DomainError;

pub use crate::types::{AggregateType, EventType};

/// One immutable fact that happened to one aggregate instance.
///
/// Events are created once by command handling, persisted by an event
/// store, and never mutated afterwards. `version` is 1-based and strictly
/// increasing within the stream of `aggregate_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name used for routing and payload decoding.
    pub event_type: EventType,
    /// Type of the aggregate this event belongs to.
    pub aggregate_type: AggregateType,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// Position of this event within its stream, starting at 1.
    pub version: i64,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
    /// Opaque event payload.
    pub payload: Value,
    /// Marshaled request context of the command that produced the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl Event {
    /// Creates a new event with a fresh identifier and no context snapshot.
    #[must_use]
    pub fn new(
        event_type: EventType,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        version: i64,
        occurred_at: DateTime<Utc>,
        payload: Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            aggregate_type,
            aggregate_id,
            version,
            occurred_at,
            payload,
            context: None,
        }
    }

    /// Attaches a marshaled context snapshot.
    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }

    /// Deserializes the payload into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match `T`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "could not decode payload of {}@{}: {e}",
                self.event_type, self.version
            ))
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.event_type, self.version)
    }
}

/// Abstraction over system time for deterministic event timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
