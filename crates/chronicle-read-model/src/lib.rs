//! Read-side storage for the Chronicle runtime.
//!
//! - [`MemoryRepository`] stores entities per namespace in process memory.
//! - [`VersionedRepository`] waits for an entity to reach the min version
//!   carried by the context before returning it.
//! - [`ProjectorHandler`] turns events into read-model updates.

pub mod config;
pub mod memory_repository;
pub mod projector;
pub mod versioned_repository;

pub use config::PollConfig;
pub use memory_repository::MemoryRepository;
pub use projector::{EntityFactory, Projector, ProjectorHandler};
pub use versioned_repository::VersionedRepository;
