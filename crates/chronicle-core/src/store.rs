//! Event store and aggregate store contracts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::context::Context;
use crate::error::DomainError;
use crate::event::{AggregateType, Event};

/// Append-only, per-aggregate event log with optimistic concurrency.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Loads the full history of a stream in ascending version order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the stream has never
    /// been written.
    async fn load(&self, ctx: &Context, aggregate_id: Uuid) -> Result<Vec<Event>, DomainError>;

    /// Appends `events` to their stream if its current version equals
    /// `original_version`. Nothing is appended on failure.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidEventBatch` for an empty, multi-stream,
    /// or non-consecutive batch, and `DomainError::ConcurrencyConflict`
    /// when the stream has moved past `original_version`.
    async fn save(
        &self,
        ctx: &Context,
        events: &[Event],
        original_version: i64,
    ) -> Result<(), DomainError>;
}

/// Loads aggregates by replaying their stream and commits their new events.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Rehydrates the aggregate `id` of `aggregate_type`.
    ///
    /// # Errors
    ///
    /// Returns `AggregateNotRegistered`, `InvalidAggregateType`,
    /// `MismatchedEventType` or `ApplyEvent`; a partially rehydrated
    /// aggregate is never returned.
    async fn load(
        &self,
        ctx: &Context,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn Aggregate>, DomainError>;

    /// Commits the aggregate's uncommitted events.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrencyConflict` if another writer committed first; the
    /// aggregate is left untouched so the caller may reload and retry.
    async fn save(&self, ctx: &Context, aggregate: &mut dyn Aggregate) -> Result<(), DomainError>;
}

/// Checks that `events` form a valid append batch for `original_version`:
/// non-empty, one stream and one aggregate type, versions consecutive from
/// `original_version + 1`. Returns the stream id.
///
/// # Errors
///
/// Returns `DomainError::InvalidEventBatch` describing the first violation.
pub fn check_event_batch(events: &[Event], original_version: i64) -> Result<Uuid, DomainError> {
    let Some(first) = events.first() else {
        return Err(DomainError::InvalidEventBatch("no events to save".into()));
    };

    let mut expected_version = original_version;
    for (idx, event) in events.iter().enumerate() {
        if event.aggregate_id != first.aggregate_id {
            return Err(DomainError::InvalidEventBatch(format!(
                "batch contains multiple aggregate ids (index {idx})"
            )));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(DomainError::InvalidEventBatch(format!(
                "batch contains multiple aggregate types (index {idx})"
            )));
        }
        expected_version += 1;
        if event.version != expected_version {
            return Err(DomainError::InvalidEventBatch(format!(
                "event at index {idx} has version {}, expected {expected_version}",
                event.version
            )));
        }
    }

    Ok(first.aggregate_id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::event::EventType;

    fn make_event(aggregate_id: Uuid, version: i64) -> Event {
        Event::new(
            EventType::from_static("test"),
            AggregateType::from_static("test"),
            aggregate_id,
            version,
            Utc::now(),
            json!({}),
        )
    }

    #[test]
    fn test_check_event_batch_accepts_consecutive_versions() {
        let id = Uuid::new_v4();

        let result = check_event_batch(&[make_event(id, 3), make_event(id, 4)], 2);

        assert_eq!(result.unwrap(), id);
    }

    #[test]
    fn test_check_event_batch_rejects_empty_batch() {
        assert!(matches!(
            check_event_batch(&[], 0),
            Err(DomainError::InvalidEventBatch(_))
        ));
    }

    #[test]
    fn test_check_event_batch_rejects_multiple_streams() {
        let result = check_event_batch(&[make_event(Uuid::new_v4(), 1), make_event(Uuid::new_v4(), 2)], 0);

        assert!(matches!(result, Err(DomainError::InvalidEventBatch(_))));
    }

    #[test]
    fn test_check_event_batch_rejects_version_gap() {
        let id = Uuid::new_v4();

        let result = check_event_batch(&[make_event(id, 1), make_event(id, 3)], 0);

        assert!(matches!(result, Err(DomainError::InvalidEventBatch(_))));
    }

    #[test]
    fn test_check_event_batch_rejects_batch_not_following_original_version() {
        let id = Uuid::new_v4();

        let result = check_event_batch(&[make_event(id, 1)], 4);

        assert!(matches!(result, Err(DomainError::InvalidEventBatch(_))));
    }
}
