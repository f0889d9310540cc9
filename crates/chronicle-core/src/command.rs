//! Command abstractions and command-handler middleware.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::Context;
use crate::error::DomainError;
use crate::event::AggregateType;

pub use crate::types::CommandType;

/// An intent directed at one aggregate instance.
pub trait Command: Send + Sync + fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> CommandType;

    /// The aggregate the command targets.
    fn aggregate_id(&self) -> Uuid;

    /// The type of the aggregate the command targets.
    fn aggregate_type(&self) -> AggregateType;

    /// Allows aggregates to downcast to the concrete command.
    fn as_any(&self) -> &dyn Any;
}

/// Handles a command end to end.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handles `command` under `ctx`.
    async fn handle_command(&self, ctx: &Context, command: &dyn Command)
    -> Result<(), DomainError>;
}

/// Wraps a command handler in another one with the same contract.
pub type CommandHandlerMiddleware =
    Arc<dyn Fn(Arc<dyn CommandHandler>) -> Arc<dyn CommandHandler> + Send + Sync>;

/// Wraps `handler` in `middleware`.
///
/// The first middleware in the slice is the outermost wrapper, so on each
/// call the middleware run in the order given before reaching `handler`.
#[must_use]
pub fn use_command_handler_middleware(
    handler: Arc<dyn CommandHandler>,
    middleware: &[CommandHandlerMiddleware],
) -> Arc<dyn CommandHandler> {
    middleware.iter().rev().fold(handler, |inner, wrap| wrap(inner))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug)]
    struct TestCommand;

    impl Command for TestCommand {
        fn command_type(&self) -> CommandType {
            CommandType::from_static("test")
        }

        fn aggregate_id(&self) -> Uuid {
            Uuid::nil()
        }

        fn aggregate_type(&self) -> AggregateType {
            AggregateType::from_static("test")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct NoopHandler;

    #[async_trait]
    impl CommandHandler for NoopHandler {
        async fn handle_command(
            &self,
            _ctx: &Context,
            _command: &dyn Command,
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct Recording {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
        inner: Arc<dyn CommandHandler>,
    }

    #[async_trait]
    impl CommandHandler for Recording {
        async fn handle_command(
            &self,
            ctx: &Context,
            command: &dyn Command,
        ) -> Result<(), DomainError> {
            self.order.lock().unwrap().push(format!("{} before", self.name));
            let result = self.inner.handle_command(ctx, command).await;
            self.order.lock().unwrap().push(format!("{} after", self.name));
            result
        }
    }

    fn recording(name: &'static str, order: &Arc<Mutex<Vec<String>>>) -> CommandHandlerMiddleware {
        let order = Arc::clone(order);
        Arc::new(move |inner: Arc<dyn CommandHandler>| {
            Arc::new(Recording {
                name,
                order: Arc::clone(&order),
                inner,
            }) as Arc<dyn CommandHandler>
        })
    }

    #[tokio::test]
    async fn test_middleware_runs_in_listed_order() {
        // Arrange
        let order = Arc::new(Mutex::new(Vec::new()));
        let handler = use_command_handler_middleware(
            Arc::new(NoopHandler),
            &[
                recording("first", &order),
                recording("second", &order),
                recording("third", &order),
            ],
        );

        // Act
        handler
            .handle_command(&Context::background(), &TestCommand)
            .await
            .unwrap();

        // Assert
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "first before",
                "second before",
                "third before",
                "third after",
                "second after",
                "first after",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_middleware_returns_handler_unchanged() {
        let handler: Arc<dyn CommandHandler> = Arc::new(NoopHandler);

        let wrapped = use_command_handler_middleware(Arc::clone(&handler), &[]);

        assert!(Arc::ptr_eq(&handler, &wrapped));
    }
}
