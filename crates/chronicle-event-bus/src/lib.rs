//! In-process publish/subscribe for persisted events.

pub mod local;

pub use local::{DEFAULT_ERROR_CAPACITY, LocalEventBus, ObserverFailure};
