//! Tracing decorators for the runtime contracts.
//!
//! Each decorator implements the same trait as the component it wraps,
//! forwards every call unchanged, and runs it inside a `tracing` span
//! named after the operation. On completion it emits an event carrying
//! `elapsed_ms` and `status`.

mod aggregate_store;
mod bus;
mod command;
mod event_store;
mod handler;
mod timing;

pub use aggregate_store::TracingAggregateStore;
pub use bus::TracingEventBus;
pub use command::{TracingCommandHandler, command_tracing_middleware};
pub use event_store::TracingEventStore;
pub use handler::{TracingEventHandler, event_tracing_middleware};
