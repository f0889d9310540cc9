//! Aggregate store backed by an event store.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::aggregate::Aggregate;
use chronicle_core::context::{Context, ContextCodec};
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateType, Event};
use chronicle_core::handler::EventHandler;
use chronicle_core::registry::AggregateRegistry;
use chronicle_core::store::{AggregateStore, EventStore};

/// Loads aggregates by replaying their event stream and saves the events
/// they produce under optimistic concurrency.
///
/// Saved events are optionally stamped with the marshaled context of the
/// saving call and forwarded to a downstream handler, normally an event bus.
#[derive(Clone)]
pub struct EventSourcedAggregateStore {
    store: Arc<dyn EventStore>,
    registry: Arc<AggregateRegistry>,
    publisher: Option<Arc<dyn EventHandler>>,
    codec: Option<Arc<ContextCodec>>,
}

impl std::fmt::Debug for EventSourcedAggregateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcedAggregateStore")
            .field("registry", &self.registry)
            .field(
                "publisher",
                &self.publisher.as_ref().map(|p| p.handler_type()),
            )
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl EventSourcedAggregateStore {
    /// Creates a store reading and writing through `store` and building
    /// aggregates from `registry`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, registry: Arc<AggregateRegistry>) -> Self {
        Self {
            store,
            registry,
            publisher: None,
            codec: None,
        }
    }

    /// Forwards every saved event to `publisher`.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventHandler>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Stamps every saved event with `codec.marshal(ctx)`.
    #[must_use]
    pub fn with_context_codec(mut self, codec: Arc<ContextCodec>) -> Self {
        self.codec = Some(codec);
        self
    }
}

/// Applies `events` in order, advancing the version once per event.
fn apply_events(aggregate: &mut dyn Aggregate, events: &[Event]) -> Result<(), DomainError> {
    for event in events {
        DomainError::check_aggregate_type(aggregate.aggregate_type(), event)?;

        let applied = if event.aggregate_id == aggregate.entity_id() {
            aggregate.apply_event(event)
        } else {
            Err(DomainError::Validation(format!(
                "event belongs to aggregate {}",
                event.aggregate_id
            )))
        };
        applied.map_err(|source| DomainError::ApplyEvent {
            event_id: event.event_id,
            event_type: event.event_type.clone(),
            aggregate_id: aggregate.entity_id(),
            version: event.version,
            source: Box::new(source),
        })?;
        aggregate.increment_version();
    }
    Ok(())
}

#[async_trait]
impl AggregateStore for EventSourcedAggregateStore {
    async fn load(
        &self,
        ctx: &Context,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn Aggregate>, DomainError> {
        ctx.check()?;

        let mut aggregate = self.registry.create(aggregate_type, id)?;
        if aggregate.aggregate_type() != aggregate_type {
            return Err(DomainError::InvalidAggregateType {
                expected: aggregate_type.clone(),
                actual: aggregate.aggregate_type().clone(),
            });
        }

        let events = match self.store.load(ctx, id).await {
            Ok(events) => events,
            Err(DomainError::AggregateNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        apply_events(aggregate.as_mut(), &events)?;

        tracing::debug!(
            aggregate_type = %aggregate_type,
            aggregate_id = %id,
            version = aggregate.version(),
            "loaded aggregate"
        );
        Ok(aggregate)
    }

    async fn save(&self, ctx: &Context, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        if aggregate.uncommitted_events().is_empty() {
            return Ok(());
        }
        ctx.check()?;

        let events: Vec<Event> = match &self.codec {
            Some(codec) => {
                let stamp = codec.marshal(ctx);
                aggregate
                    .uncommitted_events()
                    .iter()
                    .map(|event| event.clone().with_context(stamp.clone()))
                    .collect()
            }
            None => aggregate.uncommitted_events().to_vec(),
        };

        self.store.save(ctx, &events, aggregate.version()).await?;

        aggregate.clear_uncommitted_events();
        apply_events(aggregate, &events)?;
        tracing::debug!(
            aggregate_type = %aggregate.aggregate_type(),
            aggregate_id = %aggregate.entity_id(),
            version = aggregate.version(),
            committed = events.len(),
            "saved aggregate"
        );

        if let Some(publisher) = &self.publisher {
            for event in &events {
                publisher.handle_event(ctx, event).await?;
            }
        }
        Ok(())
    }
}
