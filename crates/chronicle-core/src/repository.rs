//! Read-model repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::Context;
use crate::error::DomainError;

/// A materialized read-model entity.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Returns the entity identifier.
    fn entity_id(&self) -> Uuid;
}

/// An entity that records the aggregate version it was projected from.
pub trait Versionable {
    /// The version of the last event projected into the entity.
    fn aggregate_version(&self) -> i64;
}

/// Storage for read-model entities.
#[async_trait]
pub trait ReadRepository<E: Entity>: Send + Sync {
    /// Finds an entity by id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` if no entity has that id.
    async fn find(&self, ctx: &Context, id: Uuid) -> Result<E, DomainError>;

    /// Returns every entity.
    async fn find_all(&self, ctx: &Context) -> Result<Vec<E>, DomainError>;

    /// Inserts or replaces an entity.
    async fn save(&self, ctx: &Context, entity: E) -> Result<(), DomainError>;

    /// Removes an entity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` if no entity has that id.
    async fn remove(&self, ctx: &Context, id: Uuid) -> Result<(), DomainError>;
}
