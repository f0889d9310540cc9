//! Tracing decorator for the event bus.
//!
//! Handlers and observers registered through the decorator are wrapped
//! too, so each dispatch gets its own span.

use std::sync::Arc;

use async_trait::async_trait;

use chronicle_core::bus::EventBus;
use chronicle_core::context::Context;
use chronicle_core::error::{DomainError, RegistrationError};
use chronicle_core::event::Event;
use chronicle_core::handler::{EventHandler, HandlerType};
use chronicle_core::matcher::Matcher;

use crate::handler::TracingEventHandler;
use crate::timing::traced;

/// Traces publishing on any event bus, and every handler and observer
/// registered through it.
#[derive(Clone)]
pub struct TracingEventBus {
    inner: Arc<dyn EventBus>,
}

impl TracingEventBus {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EventBus>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl EventHandler for TracingEventBus {
    fn handler_type(&self) -> HandlerType {
        self.inner.handler_type()
    }

    async fn handle_event(&self, ctx: &Context, event: &Event) -> Result<(), DomainError> {
        let span = tracing::info_span!(
            "EventBus.publish_event",
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            version = event.version,
            namespace = ctx.namespace(),
        );
        traced(span, self.inner.handle_event(ctx, event)).await
    }
}

impl EventBus for TracingEventBus {
    fn add_handler(
        &self,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError> {
        self.inner
            .add_handler(matcher, Arc::new(TracingEventHandler::new(handler)))
    }

    fn add_observer(
        &self,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError> {
        self.inner
            .add_observer(matcher, Arc::new(TracingEventHandler::new(handler)))
    }
}
