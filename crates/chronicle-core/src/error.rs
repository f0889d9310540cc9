//! Domain and registration error types.

use thiserror::Error;
use uuid::Uuid;

use crate::command::CommandType;
use crate::context::Context;
use crate::event::{AggregateType, Event, EventType};
use crate::handler::HandlerType;

/// Top-level error type for every runtime operation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No aggregate constructor is registered for the requested type.
    #[error("aggregate type {0} is not registered")]
    AggregateNotRegistered(AggregateType),

    /// A constructor produced an aggregate of a different type than requested.
    #[error("invalid aggregate type: expected {expected}, got {actual}")]
    InvalidAggregateType {
        /// The requested aggregate type.
        expected: AggregateType,
        /// The type the constructor actually produced.
        actual: AggregateType,
    },

    /// An event stream has never been written.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// A read-model entity does not exist.
    #[error("entity not found: {0}")]
    EntityNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// Replaying a stored event onto an aggregate failed.
    #[error("could not apply event {event_type}@{version} to aggregate {aggregate_id}: {source}")]
    ApplyEvent {
        /// Identifier of the offending event.
        event_id: Uuid,
        /// Type of the offending event.
        event_type: EventType,
        /// Aggregate being rehydrated.
        aggregate_id: Uuid,
        /// Version of the offending event.
        version: i64,
        /// The apply failure.
        #[source]
        source: Box<DomainError>,
    },

    /// An event targets a different aggregate type than its consumer expects.
    #[error("mismatched event type: {event_type}@{version} targets {actual}, expected {expected}")]
    MismatchedEventType {
        /// The aggregate type the consumer handles.
        expected: AggregateType,
        /// The aggregate type carried by the event.
        actual: AggregateType,
        /// Type of the rejected event.
        event_type: EventType,
        /// Version of the rejected event.
        version: i64,
    },

    /// An event batch handed to a store was empty, spanned streams, or was
    /// not versioned consecutively.
    #[error("invalid event batch: {0}")]
    InvalidEventBatch(String),

    /// A deadline elapsed before the operation completed.
    #[error("deadline exceeded: {0}")]
    Timeout(String),

    /// The request context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// A synchronous event handler failed during publish.
    #[error("event handler {handler_type} failed: {source}: ({event_type}@{version}, namespace {namespace})")]
    EventHandler {
        /// The failing handler.
        handler_type: HandlerType,
        /// Namespace of the publishing context.
        namespace: String,
        /// Type of the event being handled.
        event_type: EventType,
        /// Aggregate type of the event being handled.
        aggregate_type: AggregateType,
        /// Aggregate of the event being handled.
        aggregate_id: Uuid,
        /// Version of the event being handled.
        version: i64,
        /// The handler's failure.
        #[source]
        source: Box<DomainError>,
    },

    /// Projecting an event into a read model failed.
    #[error("projector: {source}: aggregate {aggregate_id}, type {aggregate_type}, event {event_type}@{version} (namespace {namespace})")]
    Projector {
        /// Namespace of the projecting context.
        namespace: String,
        /// Type of the event being projected.
        event_type: EventType,
        /// Aggregate type of the event being projected.
        aggregate_type: AggregateType,
        /// Aggregate of the event being projected.
        aggregate_id: Uuid,
        /// Version of the event being projected.
        version: i64,
        /// The projection failure.
        #[source]
        source: Box<DomainError>,
    },

    /// A read-model entity carried a version that breaks monotonicity.
    #[error("incorrect entity version: {0}")]
    IncorrectEntityVersion(String),

    /// No command handler is routed for a command type.
    #[error("no handler for command type {0}")]
    HandlerNotFound(CommandType),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Wraps a synchronous handler failure with the event and namespace it
    /// occurred under.
    #[must_use]
    pub fn event_handler(
        handler_type: HandlerType,
        ctx: &Context,
        event: &Event,
        source: DomainError,
    ) -> Self {
        Self::EventHandler {
            handler_type,
            namespace: ctx.namespace().to_owned(),
            event_type: event.event_type.clone(),
            aggregate_type: event.aggregate_type.clone(),
            aggregate_id: event.aggregate_id,
            version: event.version,
            source: Box::new(source),
        }
    }

    /// Wraps a projection failure with the event and namespace it occurred
    /// under.
    #[must_use]
    pub fn projector(ctx: &Context, event: &Event, source: DomainError) -> Self {
        Self::Projector {
            namespace: ctx.namespace().to_owned(),
            event_type: event.event_type.clone(),
            aggregate_type: event.aggregate_type.clone(),
            aggregate_id: event.aggregate_id,
            version: event.version,
            source: Box::new(source),
        }
    }

    /// Returns a mismatch error if `event` does not belong to `expected`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MismatchedEventType` on mismatch.
    pub fn check_aggregate_type(expected: &AggregateType, event: &Event) -> Result<(), Self> {
        if &event.aggregate_type == expected {
            return Ok(());
        }
        Err(Self::MismatchedEventType {
            expected: expected.clone(),
            actual: event.aggregate_type.clone(),
            event_type: event.event_type.clone(),
            version: event.version,
        })
    }

    /// Returns `true` for "stream or entity absent" errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AggregateNotFound(_) | Self::EntityNotFound(_))
    }
}

/// Composition-time errors raised while wiring registries and buses.
///
/// These indicate programming mistakes; callers wiring the system at
/// startup normally treat them as fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Attempt to register a type under the empty name.
    #[error("attempt to register empty {0} type")]
    EmptyType(&'static str),

    /// A type name was registered twice.
    #[error("registering duplicate {kind} type {name:?}")]
    DuplicateType {
        /// What kind of registry rejected the type.
        kind: &'static str,
        /// The duplicated type name.
        name: String,
    },

    /// The same handler was added twice under an equivalent matcher.
    #[error("handler {0} already added under an equivalent matcher")]
    DuplicateHandler(HandlerType),
}
