//! Integration tests for `MemoryEventStore`.

use std::sync::Arc;

use chrono::Utc;
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateType, Event, EventType};
use chronicle_core::store::EventStore;
use chronicle_event_store::MemoryEventStore;
use uuid::Uuid;

/// Helper to build an `Event` with sensible defaults.
fn make_event(aggregate_id: Uuid, version: i64) -> Event {
    make_typed_event("account", aggregate_id, version)
}

fn make_typed_event(aggregate_type: &'static str, aggregate_id: Uuid, version: i64) -> Event {
    Event::new(
        EventType::from_static("TestEvent"),
        AggregateType::from_static(aggregate_type),
        aggregate_id,
        version,
        Utc::now(),
        serde_json::json!({"key": "value", "version": version}),
    )
}

// --- load ---

#[tokio::test]
async fn test_load_unknown_stream_returns_aggregate_not_found() {
    let store = MemoryEventStore::new();
    let aggregate_id = Uuid::new_v4();

    let result = store.load(&Context::background(), aggregate_id).await;

    assert!(matches!(result, Err(DomainError::AggregateNotFound(id)) if id == aggregate_id));
}

// --- save + load round-trip ---

#[tokio::test]
async fn test_save_and_load_single_event() {
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let aggregate_id = Uuid::new_v4();
    let event = make_event(aggregate_id, 1);

    store.save(&ctx, &[event.clone()], 0).await.unwrap();

    let loaded = store.load(&ctx, aggregate_id).await.unwrap();
    assert_eq!(loaded, vec![event]);
}

// --- ordering ---

#[tokio::test]
async fn test_chained_saves_load_in_version_order() {
    // Arrange
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let aggregate_id = Uuid::new_v4();
    let first_batch = vec![make_event(aggregate_id, 1), make_event(aggregate_id, 2)];
    let second_batch = vec![make_event(aggregate_id, 3)];
    let third_batch = vec![make_event(aggregate_id, 4), make_event(aggregate_id, 5)];

    // Act
    store.save(&ctx, &first_batch, 0).await.unwrap();
    store.save(&ctx, &second_batch, 2).await.unwrap();
    store.save(&ctx, &third_batch, 3).await.unwrap();

    // Assert
    let loaded = store.load(&ctx, aggregate_id).await.unwrap();
    let expected: Vec<Event> = first_batch
        .into_iter()
        .chain(second_batch)
        .chain(third_batch)
        .collect();
    assert_eq!(loaded, expected);
    let versions: Vec<i64> = loaded.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);
}

// --- stream isolation ---

#[tokio::test]
async fn test_streams_are_isolated_by_aggregate_id() {
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let agg_a = Uuid::new_v4();
    let agg_b = Uuid::new_v4();

    store.save(&ctx, &[make_event(agg_a, 1)], 0).await.unwrap();
    store.save(&ctx, &[make_event(agg_b, 1)], 0).await.unwrap();

    let loaded_a = store.load(&ctx, agg_a).await.unwrap();
    let loaded_b = store.load(&ctx, agg_b).await.unwrap();
    assert_eq!(loaded_a.len(), 1);
    assert_eq!(loaded_b.len(), 1);
    assert_eq!(loaded_a[0].aggregate_id, agg_a);
    assert_eq!(loaded_b[0].aggregate_id, agg_b);
}

#[tokio::test]
async fn test_streams_are_isolated_by_namespace() {
    let store = MemoryEventStore::new();
    let tenant_a = Context::background().with_namespace("tenant-a");
    let tenant_b = Context::background().with_namespace("tenant-b");
    let aggregate_id = Uuid::new_v4();

    store
        .save(&tenant_a, &[make_event(aggregate_id, 1)], 0)
        .await
        .unwrap();

    assert_eq!(store.load(&tenant_a, aggregate_id).await.unwrap().len(), 1);
    assert!(matches!(
        store.load(&tenant_b, aggregate_id).await,
        Err(DomainError::AggregateNotFound(_))
    ));
    // The same id starts a fresh stream in another namespace.
    store
        .save(&tenant_b, &[make_event(aggregate_id, 1)], 0)
        .await
        .unwrap();
}

// --- concurrency ---

#[tokio::test]
async fn test_stale_original_version_is_a_conflict_and_appends_nothing() {
    // Arrange
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let aggregate_id = Uuid::new_v4();
    store
        .save(&ctx, &[make_event(aggregate_id, 1), make_event(aggregate_id, 2)], 0)
        .await
        .unwrap();

    // Act
    let result = store
        .save(&ctx, &[make_event(aggregate_id, 2), make_event(aggregate_id, 3)], 1)
        .await;

    // Assert
    match result {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id: id,
            expected,
            actual,
        }) => {
            assert_eq!(id, aggregate_id);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
    assert_eq!(store.load(&ctx, aggregate_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_original_version_ahead_of_stream_is_a_conflict() {
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let aggregate_id = Uuid::new_v4();

    let result = store.save(&ctx, &[make_event(aggregate_id, 4)], 3).await;

    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict { expected: 3, actual: 0, .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_with_same_original_version_admit_exactly_one() {
    // Arrange
    let store = Arc::new(MemoryEventStore::new());
    let ctx = Context::background();
    let aggregate_id = Uuid::new_v4();
    store
        .save(&ctx, &[make_event(aggregate_id, 1)], 0)
        .await
        .unwrap();

    // Act
    let mut tasks = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(async move {
            let batch = [make_event(aggregate_id, 2), make_event(aggregate_id, 3)];
            store.save(&ctx, &batch, 1).await
        }));
    }
    let mut succeeded = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(DomainError::ConcurrencyConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // Assert
    assert_eq!(succeeded, 1);
    assert_eq!(conflicts, 15);
    let loaded = store.load(&ctx, aggregate_id).await.unwrap();
    assert_eq!(loaded.len(), 3);
    let versions: Vec<i64> = loaded.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

// --- batch validation ---

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let store = MemoryEventStore::new();

    let result = store.save(&Context::background(), &[], 0).await;

    assert!(matches!(result, Err(DomainError::InvalidEventBatch(_))));
}

#[tokio::test]
async fn test_multi_stream_batch_is_rejected_without_appending() {
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let agg_a = Uuid::new_v4();
    let agg_b = Uuid::new_v4();

    let result = store
        .save(&ctx, &[make_event(agg_a, 1), make_event(agg_b, 2)], 0)
        .await;

    assert!(matches!(result, Err(DomainError::InvalidEventBatch(_))));
    assert!(store.load(&ctx, agg_a).await.is_err());
}

#[tokio::test]
async fn test_append_with_different_aggregate_type_is_rejected() {
    let store = MemoryEventStore::new();
    let ctx = Context::background();
    let aggregate_id = Uuid::new_v4();
    store
        .save(&ctx, &[make_typed_event("account", aggregate_id, 1)], 0)
        .await
        .unwrap();

    let result = store
        .save(&ctx, &[make_typed_event("ledger", aggregate_id, 2)], 1)
        .await;

    assert!(matches!(result, Err(DomainError::InvalidEventBatch(_))));
    assert_eq!(store.load(&ctx, aggregate_id).await.unwrap().len(), 1);
}

// --- cancellation ---

#[tokio::test]
async fn test_cancelled_context_aborts_save() {
    let store = MemoryEventStore::new();
    let (ctx, cancel) = Context::background().with_cancel();
    let aggregate_id = Uuid::new_v4();
    cancel.cancel();

    let result = store.save(&ctx, &[make_event(aggregate_id, 1)], 0).await;

    assert!(matches!(result, Err(DomainError::Cancelled)));
    assert!(matches!(
        store.load(&Context::background(), aggregate_id).await,
        Err(DomainError::AggregateNotFound(_))
    ));
}
