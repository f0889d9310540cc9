//! In-memory implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::store::{EventStore, check_event_batch};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    namespace: String,
    aggregate_id: Uuid,
}

type Stream = Arc<Mutex<Vec<Event>>>;

/// Append-only event store held in process memory.
///
/// Streams are partitioned by the context namespace. Each stream has its
/// own lock, so the version check and append for one stream are atomic
/// while saves to different streams run in parallel.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    streams: RwLock<HashMap<StreamKey, Stream>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&self, key: &StreamKey) -> Option<Stream> {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn stream_or_create(&self, key: StreamKey) -> Stream {
        if let Some(stream) = self.stream(&key) {
            return stream;
        }
        self.streams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn load(&self, ctx: &Context, aggregate_id: Uuid) -> Result<Vec<Event>, DomainError> {
        ctx.check()?;

        let key = StreamKey {
            namespace: ctx.namespace().to_owned(),
            aggregate_id,
        };
        let events = self
            .stream(&key)
            .map(|stream| stream.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default();

        if events.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        Ok(events)
    }

    async fn save(
        &self,
        ctx: &Context,
        events: &[Event],
        original_version: i64,
    ) -> Result<(), DomainError> {
        ctx.check()?;
        let aggregate_id = check_event_batch(events, original_version)?;

        let key = StreamKey {
            namespace: ctx.namespace().to_owned(),
            aggregate_id,
        };
        // Only a save that starts a stream may create one.
        let stream = if original_version == 0 {
            self.stream_or_create(key)
        } else {
            self.stream(&key)
                .ok_or_else(|| stale_version(aggregate_id, original_version, 0))?
        };
        let mut stream = stream.lock().unwrap_or_else(PoisonError::into_inner);

        #[allow(clippy::cast_possible_wrap)]
        let current_version = stream.len() as i64;
        if current_version != original_version {
            return Err(stale_version(aggregate_id, original_version, current_version));
        }

        // The aggregate type of a stream never changes.
        if let (Some(existing), Some(incoming)) = (stream.first(), events.first()) {
            if existing.aggregate_type != incoming.aggregate_type {
                return Err(DomainError::InvalidEventBatch(format!(
                    "stream {aggregate_id} holds aggregate type {}, attempted append with {}",
                    existing.aggregate_type, incoming.aggregate_type
                )));
            }
        }

        stream.extend_from_slice(events);
        tracing::debug!(
            %aggregate_id,
            namespace = ctx.namespace(),
            appended = events.len(),
            version = stream.len(),
            "appended events"
        );
        Ok(())
    }
}

fn stale_version(aggregate_id: Uuid, expected: i64, actual: i64) -> DomainError {
    tracing::debug!(%aggregate_id, expected, actual, "rejecting append on stale version");
    DomainError::ConcurrencyConflict {
        aggregate_id,
        expected,
        actual,
    }
}
