//! In-memory read repository.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::repository::{Entity, ReadRepository};

/// Read-model storage held in process memory, partitioned by namespace.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    namespaces: RwLock<HashMap<String, HashMap<Uuid, E>>>,
}

impl<E> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> MemoryRepository<E> {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<E: Entity> ReadRepository<E> for MemoryRepository<E> {
    async fn find(&self, ctx: &Context, id: Uuid) -> Result<E, DomainError> {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ctx.namespace())
            .and_then(|entities| entities.get(&id))
            .cloned()
            .ok_or(DomainError::EntityNotFound(id))
    }

    /// Entities are returned in no particular order.
    async fn find_all(&self, ctx: &Context) -> Result<Vec<E>, DomainError> {
        Ok(self
            .namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ctx.namespace())
            .map(|entities| entities.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn save(&self, ctx: &Context, entity: E) -> Result<(), DomainError> {
        if entity.entity_id().is_nil() {
            return Err(DomainError::Validation("entity has a nil id".into()));
        }
        self.namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ctx.namespace().to_owned())
            .or_default()
            .insert(entity.entity_id(), entity);
        Ok(())
    }

    async fn remove(&self, ctx: &Context, id: Uuid) -> Result<(), DomainError> {
        self.namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(ctx.namespace())
            .and_then(|entities| entities.remove(&id))
            .map(|_| ())
            .ok_or(DomainError::EntityNotFound(id))
    }
}
