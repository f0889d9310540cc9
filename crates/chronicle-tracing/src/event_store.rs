//! Tracing decorator for `EventStore`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::store::EventStore;

use crate::timing::traced;

/// Traces `load` and `save` of any event store.
#[derive(Clone)]
pub struct TracingEventStore {
    inner: Arc<dyn EventStore>,
}

impl TracingEventStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EventStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl EventStore for TracingEventStore {
    async fn load(&self, ctx: &Context, aggregate_id: Uuid) -> Result<Vec<Event>, DomainError> {
        let span = tracing::info_span!(
            "EventStore.load",
            %aggregate_id,
            namespace = ctx.namespace(),
            events = tracing::field::Empty,
        );
        let events = traced(span.clone(), self.inner.load(ctx, aggregate_id)).await?;
        span.record("events", events.len());
        Ok(events)
    }

    async fn save(
        &self,
        ctx: &Context,
        events: &[Event],
        original_version: i64,
    ) -> Result<(), DomainError> {
        let span = tracing::info_span!(
            "EventStore.save",
            aggregate_id = ?events.first().map(|e| e.aggregate_id),
            namespace = ctx.namespace(),
            events = events.len(),
            original_version,
        );
        traced(span, self.inner.save(ctx, events, original_version)).await
    }
}
