//! Routes commands to handlers by command type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use chronicle_core::command::{Command, CommandHandler, CommandType};
use chronicle_core::context::Context;
use chronicle_core::error::{DomainError, RegistrationError};

/// A command handler that delegates to the handler registered for each
/// command type.
#[derive(Clone, Default)]
pub struct CommandRouter {
    handlers: HashMap<CommandType, Arc<dyn CommandHandler>>,
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("command_types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRouter {
    /// Creates a router with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `command_type` to `handler`.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::EmptyType` for an empty command type and
    /// `RegistrationError::DuplicateType` if the type is already routed.
    pub fn set_handler(
        &mut self,
        command_type: CommandType,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistrationError> {
        if command_type.is_empty() {
            return Err(RegistrationError::EmptyType("command"));
        }
        if self.handlers.contains_key(&command_type) {
            return Err(RegistrationError::DuplicateType {
                kind: "command",
                name: command_type.to_string(),
            });
        }
        self.handlers.insert(command_type, handler);
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for CommandRouter {
    async fn handle_command(
        &self,
        ctx: &Context,
        command: &dyn Command,
    ) -> Result<(), DomainError> {
        let command_type = command.command_type();
        let handler = self
            .handlers
            .get(&command_type)
            .ok_or(DomainError::HandlerNotFound(command_type))?;
        handler.handle_command(ctx, command).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chronicle_test_support::MockCommand;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    struct CountingHandler {
        seen: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl CommandHandler for CountingHandler {
        async fn handle_command(
            &self,
            _ctx: &Context,
            command: &dyn Command,
        ) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(command.aggregate_id());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_router_dispatches_by_command_type() {
        // Arrange
        let inner = Arc::new(CountingHandler::default());
        let mut router = CommandRouter::new();
        router
            .set_handler(CommandType::from_static("mock_command"), inner.clone())
            .unwrap();
        let id = Uuid::new_v4();

        // Act
        router
            .handle_command(&Context::background(), &MockCommand::new(id, &["a"]))
            .await
            .unwrap();

        // Assert
        assert_eq!(*inner.seen.lock().unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn test_router_reports_unrouted_command_type() {
        let router = CommandRouter::new();

        let result = router
            .handle_command(&Context::background(), &MockCommand::new(Uuid::new_v4(), &[]))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::HandlerNotFound(t)) if t.as_str() == "mock_command"
        ));
    }

    #[test]
    fn test_set_handler_rejects_duplicate_and_empty_types() {
        let mut router = CommandRouter::new();
        router
            .set_handler(
                CommandType::from_static("open"),
                Arc::new(CountingHandler::default()),
            )
            .unwrap();

        let duplicate = router.set_handler(
            CommandType::from_static("open"),
            Arc::new(CountingHandler::default()),
        );
        let empty = router.set_handler(
            CommandType::from_static(""),
            Arc::new(CountingHandler::default()),
        );

        assert_eq!(
            duplicate,
            Err(RegistrationError::DuplicateType {
                kind: "command",
                name: "open".into(),
            })
        );
        assert_eq!(empty, Err(RegistrationError::EmptyType("command")));
    }
}
