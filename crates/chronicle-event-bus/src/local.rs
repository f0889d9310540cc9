//! Local event bus.
//!
//! Handlers run synchronously on the publishing call path in registration
//! order, and the first failure stops dispatch. Observers run as detached
//! tasks; their failures are logged and broadcast on an error channel but
//! never reach the publisher.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use chronicle_core::bus::EventBus;
use chronicle_core::context::Context;
use chronicle_core::error::{DomainError, RegistrationError};
use chronicle_core::event::Event;
use chronicle_core::handler::{EventHandler, HandlerType};
use chronicle_core::matcher::Matcher;

/// Default capacity of the observer error channel.
pub const DEFAULT_ERROR_CAPACITY: usize = 256;

/// An observer failure reported out of band.
#[derive(Debug, Clone)]
pub struct ObserverFailure {
    /// The failing observer.
    pub handler_type: HandlerType,
    /// The event it failed on.
    pub event: Event,
    /// What went wrong.
    pub error: Arc<DomainError>,
}

#[derive(Clone)]
struct Subscription {
    matcher: Matcher,
    handler: Arc<dyn EventHandler>,
}

/// In-process event bus.
pub struct LocalEventBus {
    handlers: RwLock<Vec<Subscription>>,
    observers: RwLock<Vec<Subscription>>,
    errors: broadcast::Sender<ObserverFailure>,
}

impl std::fmt::Debug for LocalEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |subs: &RwLock<Vec<Subscription>>| {
            subs.read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|s| s.handler.handler_type())
                .collect::<Vec<_>>()
        };
        f.debug_struct("LocalEventBus")
            .field("handlers", &names(&self.handlers))
            .field("observers", &names(&self.observers))
            .finish_non_exhaustive()
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEventBus {
    /// Creates a bus with the default error channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_error_capacity(DEFAULT_ERROR_CAPACITY)
    }

    /// Creates a bus whose error channel buffers `capacity` failures per
    /// lagging subscriber.
    #[must_use]
    pub fn with_error_capacity(capacity: usize) -> Self {
        let (errors, _) = broadcast::channel(capacity.max(1));
        Self {
            handlers: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
            errors,
        }
    }

    /// Subscribes to observer failures.
    #[must_use]
    pub fn errors(&self) -> broadcast::Receiver<ObserverFailure> {
        self.errors.subscribe()
    }

    fn register(
        subs: &RwLock<Vec<Subscription>>,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError> {
        let handler_type = handler.handler_type();
        if handler_type.is_empty() {
            return Err(RegistrationError::EmptyType("handler"));
        }
        let mut subs = subs.write().unwrap_or_else(PoisonError::into_inner);
        if subs
            .iter()
            .any(|s| s.matcher == matcher && s.handler.handler_type() == handler_type)
        {
            return Err(RegistrationError::DuplicateHandler(handler_type));
        }
        subs.push(Subscription { matcher, handler });
        Ok(())
    }

    fn matching(subs: &RwLock<Vec<Subscription>>, event: &Event) -> Vec<Arc<dyn EventHandler>> {
        subs.read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.matcher.matches(Some(event)))
            .map(|s| Arc::clone(&s.handler))
            .collect()
    }

    fn spawn_observer(&self, ctx: Context, observer: Arc<dyn EventHandler>, event: Event) {
        let errors = self.errors.clone();
        tokio::spawn(async move {
            if let Err(error) = observer.handle_event(&ctx, &event).await {
                let handler_type = observer.handler_type();
                tracing::error!(
                    handler_type = %handler_type,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    version = event.version,
                    namespace = ctx.namespace(),
                    error = %error,
                    "observer failed"
                );
                // No receivers is fine: the failure has been logged.
                let _ = errors.send(ObserverFailure {
                    handler_type,
                    event,
                    error: Arc::new(error),
                });
            }
        });
    }
}

#[async_trait]
impl EventHandler for LocalEventBus {
    fn handler_type(&self) -> HandlerType {
        HandlerType::from_static("local_event_bus")
    }

    async fn handle_event(&self, ctx: &Context, event: &Event) -> Result<(), DomainError> {
        ctx.check()?;

        let observers = Self::matching(&self.observers, event);
        let detached = ctx.detached();
        for observer in observers {
            self.spawn_observer(detached.clone(), observer, event.clone());
        }

        for handler in Self::matching(&self.handlers, event) {
            ctx.check()?;
            if let Err(source) = handler.handle_event(ctx, event).await {
                return Err(DomainError::event_handler(
                    handler.handler_type(),
                    ctx,
                    event,
                    source,
                ));
            }
        }
        Ok(())
    }
}

impl EventBus for LocalEventBus {
    fn add_handler(
        &self,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError> {
        Self::register(&self.handlers, matcher, handler)
    }

    fn add_observer(
        &self,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError> {
        Self::register(&self.observers, matcher, handler)
    }
}
