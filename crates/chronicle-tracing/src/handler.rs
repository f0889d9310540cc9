//! Tracing decorator for event handlers, and the matching middleware.

use std::sync::Arc;

use async_trait::async_trait;

use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::handler::{EventHandler, EventHandlerMiddleware, HandlerType};

use crate::timing::traced;

/// Traces every event an event handler receives.
#[derive(Clone)]
pub struct TracingEventHandler {
    inner: Arc<dyn EventHandler>,
}

impl TracingEventHandler {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EventHandler>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl EventHandler for TracingEventHandler {
    fn handler_type(&self) -> HandlerType {
        self.inner.handler_type()
    }

    async fn handle_event(&self, ctx: &Context, event: &Event) -> Result<(), DomainError> {
        let span = tracing::info_span!(
            "EventHandler.handle_event",
            handler_type = %self.inner.handler_type(),
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            version = event.version,
            namespace = ctx.namespace(),
        );
        traced(span, self.inner.handle_event(ctx, event)).await
    }
}

/// Middleware that wraps a handler in a [`TracingEventHandler`].
#[must_use]
pub fn event_tracing_middleware() -> EventHandlerMiddleware {
    Arc::new(|inner: Arc<dyn EventHandler>| {
        Arc::new(TracingEventHandler::new(inner)) as Arc<dyn EventHandler>
    })
}
