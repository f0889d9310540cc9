//! Tracing decorator for command handlers, and the matching middleware.

use std::sync::Arc;

use async_trait::async_trait;

use chronicle_core::command::{Command, CommandHandler, CommandHandlerMiddleware};
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;

use crate::timing::traced;

/// Traces every command a command handler receives.
#[derive(Clone)]
pub struct TracingCommandHandler {
    inner: Arc<dyn CommandHandler>,
}

impl TracingCommandHandler {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn CommandHandler>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CommandHandler for TracingCommandHandler {
    async fn handle_command(
        &self,
        ctx: &Context,
        command: &dyn Command,
    ) -> Result<(), DomainError> {
        let span = tracing::info_span!(
            "CommandHandler.handle_command",
            command_type = %command.command_type(),
            aggregate_type = %command.aggregate_type(),
            aggregate_id = %command.aggregate_id(),
            namespace = ctx.namespace(),
        );
        traced(span, self.inner.handle_command(ctx, command)).await
    }
}

/// Middleware that wraps a handler in a [`TracingCommandHandler`].
#[must_use]
pub fn command_tracing_middleware() -> CommandHandlerMiddleware {
    Arc::new(|inner: Arc<dyn CommandHandler>| {
        Arc::new(TracingCommandHandler::new(inner)) as Arc<dyn CommandHandler>
    })
}
