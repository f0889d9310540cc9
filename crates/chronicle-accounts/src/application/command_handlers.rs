//! Command handling for the accounts context.
//!
//! Every account command goes through one `AggregateCommandHandler`, which
//! loads the account, lets it decide, and saves the resulting events.

use std::sync::Arc;

use chronicle_aggregate_store::{AggregateCommandHandler, CommandRouter};
use chronicle_core::command::{CommandHandler, CommandHandlerMiddleware, use_command_handler_middleware};
use chronicle_core::error::RegistrationError;
use chronicle_core::store::AggregateStore;

use crate::domain::aggregates::ACCOUNT_AGGREGATE_TYPE;
use crate::domain::commands::{
    DEPOSIT_MONEY_COMMAND_TYPE, OPEN_ACCOUNT_COMMAND_TYPE, WITHDRAW_MONEY_COMMAND_TYPE,
};

/// Routes every account command type to one account command handler.
///
/// `middleware` wraps that handler, first entry outermost.
///
/// # Errors
///
/// Returns `RegistrationError::DuplicateType` if `router` already routes
/// one of the account command types.
pub fn route_account_commands(
    router: &mut CommandRouter,
    store: Arc<dyn AggregateStore>,
    middleware: &[CommandHandlerMiddleware],
) -> Result<(), RegistrationError> {
    let handler: Arc<dyn CommandHandler> =
        Arc::new(AggregateCommandHandler::new(ACCOUNT_AGGREGATE_TYPE, store));
    let handler = use_command_handler_middleware(handler, middleware);
    for command_type in [
        OPEN_ACCOUNT_COMMAND_TYPE,
        DEPOSIT_MONEY_COMMAND_TYPE,
        WITHDRAW_MONEY_COMMAND_TYPE,
    ] {
        router.set_handler(command_type.clone(), Arc::clone(&handler))?;
        tracing::debug!(%command_type, aggregate_type = %ACCOUNT_AGGREGATE_TYPE, "command routed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chronicle_aggregate_store::EventSourcedAggregateStore;
    use chronicle_core::context::Context;
    use chronicle_core::error::DomainError;
    use chronicle_core::registry::AggregateRegistry;
    use chronicle_core::store::EventStore;
    use chronicle_event_store::MemoryEventStore;
    use chronicle_test_support::FixedClock;
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::register_account;
    use crate::domain::commands::{DepositMoney, OpenAccount, WithdrawMoney};

    fn router_over(events: Arc<dyn EventStore>) -> CommandRouter {
        let mut registry = AggregateRegistry::new();
        register_account(&mut registry, Arc::new(FixedClock::default())).unwrap();
        let store = Arc::new(EventSourcedAggregateStore::new(events, Arc::new(registry)));
        let mut router = CommandRouter::new();
        route_account_commands(&mut router, store, &[]).unwrap();
        router
    }

    #[tokio::test]
    async fn test_routed_commands_are_persisted_in_order() {
        // Arrange
        let events = Arc::new(MemoryEventStore::new());
        let router = router_over(events.clone());
        let ctx = Context::background();
        let id = Uuid::new_v4();

        // Act
        router
            .handle_command(&ctx, &OpenAccount { account_id: id, owner: "Ada".into() })
            .await
            .unwrap();
        router
            .handle_command(&ctx, &DepositMoney { account_id: id, amount: 50 })
            .await
            .unwrap();

        // Assert
        let stored = events.load(&ctx, id).await.unwrap();
        let versions: Vec<i64> = stored.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_rejected_command_persists_nothing() {
        let events = Arc::new(MemoryEventStore::new());
        let router = router_over(events.clone());
        let ctx = Context::background();
        let id = Uuid::new_v4();
        router
            .handle_command(&ctx, &OpenAccount { account_id: id, owner: "Ada".into() })
            .await
            .unwrap();

        let result = router
            .handle_command(&ctx, &WithdrawMoney { account_id: id, amount: 5 })
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(events.load(&ctx, id).await.unwrap().len(), 1);
    }

    #[test]
    fn test_routing_twice_is_a_registration_error() {
        let events: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new());
        let mut router = router_over(events.clone());
        let store = Arc::new(EventSourcedAggregateStore::new(
            events,
            Arc::new(AggregateRegistry::new()),
        ));

        let result = route_account_commands(&mut router, store, &[]);

        assert!(matches!(result, Err(RegistrationError::DuplicateType { .. })));
    }
}
