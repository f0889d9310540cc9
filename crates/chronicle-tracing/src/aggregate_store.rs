//! Tracing decorator for `AggregateStore`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use chronicle_core::aggregate::Aggregate;
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateType;
use chronicle_core::store::AggregateStore;

use crate::timing::traced;

/// Traces `load` and `save` of any aggregate store.
#[derive(Clone)]
pub struct TracingAggregateStore {
    inner: Arc<dyn AggregateStore>,
}

impl TracingAggregateStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn AggregateStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AggregateStore for TracingAggregateStore {
    async fn load(
        &self,
        ctx: &Context,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn Aggregate>, DomainError> {
        let span = tracing::info_span!(
            "AggregateStore.load",
            %aggregate_type,
            aggregate_id = %id,
            namespace = ctx.namespace(),
            version = tracing::field::Empty,
        );
        let aggregate = traced(span.clone(), self.inner.load(ctx, aggregate_type, id)).await?;
        span.record("version", aggregate.version());
        Ok(aggregate)
    }

    async fn save(&self, ctx: &Context, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        let span = tracing::info_span!(
            "AggregateStore.save",
            aggregate_type = %aggregate.aggregate_type(),
            aggregate_id = %aggregate.entity_id(),
            namespace = ctx.namespace(),
            version = aggregate.version(),
            events = aggregate.uncommitted_events().len(),
        );
        traced(span, self.inner.save(ctx, aggregate)).await
    }
}
