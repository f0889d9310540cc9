//! Aggregate factory registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::error::{DomainError, RegistrationError};
use crate::event::AggregateType;

/// Builds a zero-value aggregate for an id.
pub type AggregateConstructor = Arc<dyn Fn(Uuid) -> Box<dyn Aggregate> + Send + Sync>;

/// Maps aggregate types to their constructors.
///
/// Populated at startup with checked inserts, then shared read-only.
#[derive(Clone, Default)]
pub struct AggregateRegistry {
    constructors: HashMap<AggregateType, AggregateConstructor>,
}

impl fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AggregateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor. The constructor is called once with the
    /// nil id to learn which aggregate type it builds.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::EmptyType` if the constructed aggregate
    /// has an empty type, or `RegistrationError::DuplicateType` if the type
    /// is already registered.
    pub fn register<F>(&mut self, constructor: F) -> Result<AggregateType, RegistrationError>
    where
        F: Fn(Uuid) -> Box<dyn Aggregate> + Send + Sync + 'static,
    {
        let aggregate_type = constructor(Uuid::nil()).aggregate_type().clone();
        if aggregate_type.is_empty() {
            return Err(RegistrationError::EmptyType("aggregate"));
        }
        if self.constructors.contains_key(&aggregate_type) {
            return Err(RegistrationError::DuplicateType {
                kind: "aggregate",
                name: aggregate_type.to_string(),
            });
        }
        self.constructors
            .insert(aggregate_type.clone(), Arc::new(constructor));
        Ok(aggregate_type)
    }

    /// Builds a zero-value aggregate of `aggregate_type`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotRegistered` for an unknown type.
    pub fn create(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn Aggregate>, DomainError> {
        let constructor = self
            .constructors
            .get(aggregate_type)
            .ok_or_else(|| DomainError::AggregateNotRegistered(aggregate_type.clone()))?;
        Ok(constructor(id))
    }

    /// Returns `true` if `aggregate_type` has a constructor.
    #[must_use]
    pub fn is_registered(&self, aggregate_type: &AggregateType) -> bool {
        self.constructors.contains_key(aggregate_type)
    }
}
