//! Projection of events into read models.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateType, Event};
use chronicle_core::handler::{EventHandler, HandlerType};
use chronicle_core::repository::{Entity, ReadRepository, Versionable};

/// Folds one event into a read-model entity.
#[async_trait]
pub trait Projector<E>: Send + Sync {
    /// Identifies the projector in diagnostics.
    fn projector_type(&self) -> HandlerType;

    /// Returns the updated entity, or `None` to delete it.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be projected.
    async fn project(&self, ctx: &Context, event: &Event, entity: E)
    -> Result<Option<E>, DomainError>;
}

/// Builds the empty entity an aggregate's first event is projected into.
pub type EntityFactory<E> = Arc<dyn Fn(Uuid) -> E + Send + Sync>;

/// Event handler that keeps a read model in step with one aggregate type.
///
/// For each event it waits (through the repository's min-version support)
/// for the entity to reach the previous version, creates it from the
/// factory if it does not exist yet, projects the event, and saves or
/// removes the result. Every failure is wrapped in `DomainError::Projector`
/// carrying the event and namespace.
pub struct ProjectorHandler<E> {
    aggregate_type: AggregateType,
    projector: Arc<dyn Projector<E>>,
    repo: Arc<dyn ReadRepository<E>>,
    factory: EntityFactory<E>,
}

impl<E> std::fmt::Debug for ProjectorHandler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectorHandler")
            .field("aggregate_type", &self.aggregate_type)
            .field("projector", &self.projector.projector_type())
            .finish_non_exhaustive()
    }
}

impl<E: Entity + Versionable> ProjectorHandler<E> {
    /// Creates a handler projecting events of `aggregate_type` into `repo`.
    #[must_use]
    pub fn new(
        aggregate_type: AggregateType,
        projector: Arc<dyn Projector<E>>,
        repo: Arc<dyn ReadRepository<E>>,
        factory: EntityFactory<E>,
    ) -> Self {
        Self {
            aggregate_type,
            projector,
            repo,
            factory,
        }
    }

    async fn project(&self, ctx: &Context, event: &Event) -> Result<(), DomainError> {
        DomainError::check_aggregate_type(&self.aggregate_type, event)?;

        let find_ctx = ctx.with_min_version(event.version - 1);
        let entity = match self.repo.find(&find_ctx, event.aggregate_id).await {
            Ok(entity) => entity,
            Err(e) if e.is_not_found() => (self.factory)(event.aggregate_id),
            Err(e) => return Err(e),
        };

        if entity.aggregate_version() + 1 != event.version {
            return Err(DomainError::IncorrectEntityVersion(format!(
                "entity {} is at version {}, cannot project {event}",
                event.aggregate_id,
                entity.aggregate_version()
            )));
        }

        match self.projector.project(ctx, event, entity).await? {
            Some(projected) => {
                if projected.aggregate_version() != event.version {
                    return Err(DomainError::IncorrectEntityVersion(format!(
                        "projected entity {} has version {}, expected {}",
                        event.aggregate_id,
                        projected.aggregate_version(),
                        event.version
                    )));
                }
                self.repo.save(ctx, projected).await
            }
            None => self.repo.remove(ctx, event.aggregate_id).await,
        }
    }
}

#[async_trait]
impl<E: Entity + Versionable> EventHandler for ProjectorHandler<E> {
    fn handler_type(&self) -> HandlerType {
        self.projector.projector_type()
    }

    async fn handle_event(&self, ctx: &Context, event: &Event) -> Result<(), DomainError> {
        self.project(ctx, event).await.map_err(|source| {
            tracing::warn!(
                projector = %self.projector.projector_type(),
                event_type = %event.event_type,
                aggregate_id = %event.aggregate_id,
                version = event.version,
                error = %source,
                "projection failed"
            );
            DomainError::projector(ctx, event, source)
        })
    }
}
