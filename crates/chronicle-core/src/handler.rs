//! Event handler abstraction and event-handler middleware.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::DomainError;
use crate::event::Event;

pub use crate::types::HandlerType;

/// Reacts to persisted events, e.g. a projector updating a read model.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Identifies the handler in diagnostics and duplicate detection.
    fn handler_type(&self) -> HandlerType;

    /// Handles one event.
    async fn handle_event(&self, ctx: &Context, event: &Event) -> Result<(), DomainError>;
}

/// Wraps an event handler in another one with the same contract.
pub type EventHandlerMiddleware =
    Arc<dyn Fn(Arc<dyn EventHandler>) -> Arc<dyn EventHandler> + Send + Sync>;

/// Wraps `handler` in `middleware`; the first middleware runs first.
#[must_use]
pub fn use_event_handler_middleware(
    handler: Arc<dyn EventHandler>,
    middleware: &[EventHandlerMiddleware],
) -> Arc<dyn EventHandler> {
    middleware.iter().rev().fold(handler, |inner, wrap| wrap(inner))
}
