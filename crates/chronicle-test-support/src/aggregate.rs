//! Mock aggregate and command for exercising stores and command dispatch.

use std::any::Any;

use chrono::Utc;
use chronicle_core::aggregate::{Aggregate, AggregateBase};
use chronicle_core::command::{Command, CommandType};
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateType, Event, EventType};
use serde_json::json;
use uuid::Uuid;

/// Aggregate type of [`MockAggregate`].
pub const MOCK_AGGREGATE_TYPE: AggregateType = AggregateType::from_static("mock");

/// Event type produced by [`MockAggregate`].
pub const MOCK_EVENT_TYPE: EventType = EventType::from_static("mock_event");

/// Builds a committed-looking mock event carrying `content`.
#[must_use]
pub fn mock_event(aggregate_id: Uuid, version: i64, content: &str) -> Event {
    Event::new(
        MOCK_EVENT_TYPE,
        MOCK_AGGREGATE_TYPE,
        aggregate_id,
        version,
        Utc::now(),
        json!({ "content": content }),
    )
}

/// Appends one event per content string to a [`MockAggregate`].
///
/// An empty `contents` list is a valid command that produces no events.
#[derive(Debug, Clone)]
pub struct MockCommand {
    /// Target aggregate.
    pub aggregate_id: Uuid,
    /// Target aggregate type; [`MOCK_AGGREGATE_TYPE`] unless a test overrides it.
    pub aggregate_type: AggregateType,
    /// One event is produced per entry.
    pub contents: Vec<String>,
}

impl MockCommand {
    /// Creates a command for the mock aggregate `aggregate_id`.
    #[must_use]
    pub fn new(aggregate_id: Uuid, contents: &[&str]) -> Self {
        Self {
            aggregate_id,
            aggregate_type: MOCK_AGGREGATE_TYPE,
            contents: contents.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

impl Command for MockCommand {
    fn command_type(&self) -> CommandType {
        CommandType::from_static("mock_command")
    }

    fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    fn aggregate_type(&self) -> AggregateType {
        self.aggregate_type.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Aggregate whose state is the list of contents it has applied.
///
/// Applying an event whose content is `"poison"` fails, which lets tests
/// exercise replay errors.
#[derive(Debug)]
pub struct MockAggregate {
    base: AggregateBase,
    /// Contents applied so far, in order.
    pub contents: Vec<String>,
    /// Namespace seen by the last handled command.
    pub last_namespace: Option<String>,
}

impl MockAggregate {
    /// Creates an empty mock aggregate.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            base: AggregateBase::new(MOCK_AGGREGATE_TYPE, id),
            contents: Vec::new(),
            last_namespace: None,
        }
    }

    /// Returns the applied contents of a loaded mock aggregate.
    ///
    /// # Panics
    ///
    /// Panics if `aggregate` is not a `MockAggregate`.
    #[must_use]
    pub fn contents_of(aggregate: &dyn Aggregate) -> Vec<String> {
        aggregate
            .as_any()
            .downcast_ref::<Self>()
            .expect("not a MockAggregate")
            .contents
            .clone()
    }

    /// Boxed constructor suitable for `AggregateRegistry::register`.
    #[must_use]
    pub fn boxed(id: Uuid) -> Box<dyn Aggregate> {
        Box::new(Self::new(id))
    }
}

impl Aggregate for MockAggregate {
    fn aggregate_type(&self) -> &AggregateType {
        self.base.aggregate_type()
    }

    fn entity_id(&self) -> Uuid {
        self.base.entity_id()
    }

    fn version(&self) -> i64 {
        self.base.version()
    }

    fn increment_version(&mut self) {
        self.base.increment_version();
    }

    fn apply_event(&mut self, event: &Event) -> Result<(), DomainError> {
        let content = event
            .payload
            .get("content")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DomainError::Validation("mock event without content".into()))?;
        if content == "poison" {
            return Err(DomainError::Validation("poisoned event".into()));
        }
        self.contents.push(content.to_owned());
        Ok(())
    }

    fn handle_command(&mut self, ctx: &Context, command: &dyn Command) -> Result<(), DomainError> {
        let command = command
            .as_any()
            .downcast_ref::<MockCommand>()
            .ok_or_else(|| DomainError::Validation("unsupported command".into()))?;
        self.last_namespace = Some(ctx.namespace().to_owned());
        for content in &command.contents {
            self.base
                .append_event(MOCK_EVENT_TYPE, json!({ "content": content }), Utc::now());
        }
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Event] {
        self.base.uncommitted_events()
    }

    fn clear_uncommitted_events(&mut self) {
        self.base.clear_uncommitted_events();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
