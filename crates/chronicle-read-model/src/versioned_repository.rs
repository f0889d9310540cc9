//! Read-after-write consistency for read models.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::repository::{Entity, ReadRepository, Versionable};

use crate::config::PollConfig;

/// Wraps a read repository so that `find` honours the min version carried
/// by the context.
///
/// Without a min version (or with one below 1) `find` returns whatever the
/// inner repository holds. Otherwise it polls until the entity reaches the
/// required version, treating "not found" as "not projected yet", and fails
/// with `Timeout` when the context deadline passes first.
pub struct VersionedRepository<E> {
    inner: Arc<dyn ReadRepository<E>>,
    config: PollConfig,
}

impl<E> std::fmt::Debug for VersionedRepository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedRepository")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: Entity + Versionable> VersionedRepository<E> {
    /// Wraps `inner` with the default poll cadence.
    #[must_use]
    pub fn new(inner: Arc<dyn ReadRepository<E>>) -> Self {
        Self::with_config(inner, PollConfig::default())
    }

    /// Wraps `inner` with an explicit poll cadence.
    #[must_use]
    pub fn with_config(inner: Arc<dyn ReadRepository<E>>, config: PollConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the wrapped repository.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn ReadRepository<E>> {
        &self.inner
    }

    async fn find_with_min_version(
        &self,
        ctx: &Context,
        id: Uuid,
        min_version: i64,
    ) -> Result<E, DomainError> {
        let ctx = if ctx.deadline().is_some() {
            ctx.clone()
        } else {
            ctx.with_timeout(self.config.default_timeout)
        };
        let expired = |err: DomainError| match err {
            DomainError::Timeout(_) => DomainError::Timeout(format!(
                "entity {id} did not reach version {min_version}"
            )),
            other => other,
        };

        let mut interval = self.config.initial_interval;
        let mut attempts = 0_u32;
        loop {
            ctx.check().map_err(&expired)?;
            attempts += 1;
            match self.inner.find(&ctx, id).await {
                Ok(entity) if entity.aggregate_version() >= min_version => {
                    tracing::debug!(%id, min_version, attempts, "entity reached min version");
                    return Ok(entity);
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }

            ctx.check().map_err(&expired)?;
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = ctx.done() => {}
            }
            interval = self.config.next_interval(interval);
        }
    }
}

#[async_trait]
impl<E: Entity + Versionable> ReadRepository<E> for VersionedRepository<E> {
    async fn find(&self, ctx: &Context, id: Uuid) -> Result<E, DomainError> {
        match ctx.min_version() {
            Some(min_version) if min_version >= 1 => {
                self.find_with_min_version(ctx, id, min_version).await
            }
            _ => self.inner.find(ctx, id).await,
        }
    }

    async fn find_all(&self, ctx: &Context) -> Result<Vec<E>, DomainError> {
        self.inner.find_all(ctx).await
    }

    /// # Errors
    ///
    /// Returns `DomainError::IncorrectEntityVersion` for an entity that has
    /// not been projected from any event.
    async fn save(&self, ctx: &Context, entity: E) -> Result<(), DomainError> {
        if entity.aggregate_version() <= 0 {
            return Err(DomainError::IncorrectEntityVersion(format!(
                "entity {} has version {}",
                entity.entity_id(),
                entity.aggregate_version()
            )));
        }
        self.inner.save(ctx, entity).await
    }

    async fn remove(&self, ctx: &Context, id: Uuid) -> Result<(), DomainError> {
        self.inner.remove(ctx, id).await
    }
}
