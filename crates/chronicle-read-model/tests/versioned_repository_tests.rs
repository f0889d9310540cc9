//! Read-after-write scenarios for `VersionedRepository`.

use std::sync::Arc;
use std::time::Duration;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::repository::ReadRepository;
use chronicle_read_model::{MemoryRepository, PollConfig, VersionedRepository};
use chronicle_test_support::MockEntity;
use uuid::Uuid;

/// Seeds an entity at version 1 and advances it to version 3 after 100ms.
async fn seed_with_delayed_update() -> (VersionedRepository<MockEntity>, Uuid) {
    let inner = Arc::new(MemoryRepository::<MockEntity>::new());
    let id = Uuid::new_v4();
    inner
        .save(&Context::background(), MockEntity::new(id, 1, "version 1"))
        .await
        .unwrap();

    let writer = Arc::clone(&inner);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        writer
            .save(&Context::background(), MockEntity::new(id, 3, "version 3"))
            .await
            .unwrap();
    });

    let repo = VersionedRepository::new(inner as Arc<dyn ReadRepository<MockEntity>>);
    (repo, id)
}

#[tokio::test]
async fn test_find_with_min_version_waits_for_concurrent_update() {
    // Arrange
    let (repo, id) = seed_with_delayed_update().await;
    let ctx = Context::background()
        .with_min_version(3)
        .with_timeout(Duration::from_secs(1));

    // Act
    let found = repo.find(&ctx, id).await.unwrap();

    // Assert
    assert_eq!(found, MockEntity::new(id, 3, "version 3"));
}

#[tokio::test]
async fn test_find_with_min_version_times_out_before_update() {
    // Arrange
    let (repo, id) = seed_with_delayed_update().await;
    let ctx = Context::background()
        .with_min_version(3)
        .with_timeout(Duration::from_millis(50));

    // Act
    let result = repo.find(&ctx, id).await;

    // Assert
    match result {
        Err(DomainError::Timeout(message)) => {
            assert!(message.contains("did not reach version 3"), "{message}");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_find_with_slow_poll_cadence_still_meets_deadline() {
    let inner = Arc::new(MemoryRepository::<MockEntity>::new());
    let id = Uuid::new_v4();
    let repo = VersionedRepository::with_config(
        inner.clone() as Arc<dyn ReadRepository<MockEntity>>,
        PollConfig {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(5),
            ..PollConfig::default()
        },
    );
    let ctx = Context::background()
        .with_min_version(1)
        .with_timeout(Duration::from_millis(50));

    let started = tokio::time::Instant::now();
    let result = repo.find(&ctx, id).await;

    assert!(matches!(result, Err(DomainError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_find_all_passes_through_to_inner_repository() {
    let inner = Arc::new(MemoryRepository::<MockEntity>::new());
    let ctx = Context::background();
    inner
        .save(&ctx, MockEntity::new(Uuid::new_v4(), 2, "a"))
        .await
        .unwrap();
    let repo = VersionedRepository::new(inner as Arc<dyn ReadRepository<MockEntity>>);

    let all = repo.find_all(&ctx.with_min_version(5)).await.unwrap();

    assert_eq!(all.len(), 1);
}
