//! Event bus contract.

use std::sync::Arc;

use crate::error::RegistrationError;
use crate::handler::EventHandler;
use crate::matcher::Matcher;

/// Routes published events to registered handlers and observers.
///
/// Publishing goes through [`EventHandler::handle_event`], so a bus can be
/// chained after an aggregate store like any other handler.
pub trait EventBus: EventHandler {
    /// Registers a synchronous handler invoked on the publishing call path.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::DuplicateHandler` if the same handler is
    /// already registered under an equal matcher.
    fn add_handler(
        &self,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError>;

    /// Registers an asynchronous, best-effort observer.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::DuplicateHandler` if the same observer is
    /// already registered under an equal matcher.
    fn add_observer(
        &self,
        matcher: Matcher,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), RegistrationError>;
}
