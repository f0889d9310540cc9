//! Event store implementations for the Chronicle runtime.

pub mod memory_event_store;

pub use memory_event_store::MemoryEventStore;
