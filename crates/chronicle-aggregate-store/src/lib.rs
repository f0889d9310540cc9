//! Aggregate persistence and command dispatch.
//!
//! [`EventSourcedAggregateStore`] rebuilds aggregates by replaying their
//! event stream and commits the events they produce. An
//! [`AggregateCommandHandler`] runs the load, handle, save cycle for one
//! aggregate type, and a [`CommandRouter`] picks the handler for a command.

pub mod aggregate_store;
pub mod command_handler;
pub mod router;

pub use aggregate_store::EventSourcedAggregateStore;
pub use command_handler::AggregateCommandHandler;
pub use router::CommandRouter;
