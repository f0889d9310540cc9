//! Shared test mocks and utilities for the Chronicle runtime.

mod aggregate;
mod clock;
mod entity;
mod handler;
mod store;

pub use aggregate::{MOCK_AGGREGATE_TYPE, MOCK_EVENT_TYPE, MockAggregate, MockCommand, mock_event};
pub use clock::FixedClock;
pub use entity::MockEntity;
pub use handler::{FailingEventHandler, RecordingEventHandler};
pub use store::{FailingEventStore, RecordingEventStore};
