//! Command dispatch for one aggregate type.

use std::sync::Arc;

use async_trait::async_trait;

use chronicle_core::command::{Command, CommandHandler};
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateType;
use chronicle_core::store::AggregateStore;

/// Runs load, handle and save for commands targeting one aggregate type.
///
/// A command producing no events is a successful no-op. A concurrency
/// conflict on save is returned to the caller, who decides whether to retry.
#[derive(Clone)]
pub struct AggregateCommandHandler {
    aggregate_type: AggregateType,
    store: Arc<dyn AggregateStore>,
}

impl std::fmt::Debug for AggregateCommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateCommandHandler")
            .field("aggregate_type", &self.aggregate_type)
            .finish_non_exhaustive()
    }
}

impl AggregateCommandHandler {
    /// Creates a handler for `aggregate_type` persisting through `store`.
    #[must_use]
    pub fn new(aggregate_type: AggregateType, store: Arc<dyn AggregateStore>) -> Self {
        Self {
            aggregate_type,
            store,
        }
    }
}

#[async_trait]
impl CommandHandler for AggregateCommandHandler {
    async fn handle_command(
        &self,
        ctx: &Context,
        command: &dyn Command,
    ) -> Result<(), DomainError> {
        let target_type = command.aggregate_type();
        if target_type != self.aggregate_type {
            return Err(DomainError::InvalidAggregateType {
                expected: self.aggregate_type.clone(),
                actual: target_type,
            });
        }
        let aggregate_id = command.aggregate_id();
        if aggregate_id.is_nil() {
            return Err(DomainError::Validation(format!(
                "command {} is missing an aggregate id",
                command.command_type()
            )));
        }

        let mut aggregate = self
            .store
            .load(ctx, &self.aggregate_type, aggregate_id)
            .await?;
        aggregate.handle_command(ctx, command)?;
        ctx.check()?;
        self.store.save(ctx, aggregate.as_mut()).await?;

        tracing::info!(
            command_type = %command.command_type(),
            aggregate_type = %self.aggregate_type,
            %aggregate_id,
            version = aggregate.version(),
            "handled command"
        );
        Ok(())
    }
}
