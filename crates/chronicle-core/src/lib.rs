//! Chronicle Core: contracts and shared types.
//!
//! This crate defines the event, aggregate, command and handler
//! abstractions, the storage and read-model contracts, the request
//! context, and the error taxonomy. It contains no storage backend.

pub mod aggregate;
pub mod bus;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod matcher;
pub mod registry;
pub mod repository;
pub mod store;
pub mod types;
