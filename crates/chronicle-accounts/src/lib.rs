//! Chronicle sample bounded context: bank accounts.
//!
//! The domain layer holds the `BankAccount` aggregate with its commands and
//! events. The application layer wires command routing, projects account
//! events into the `AccountBalance` read model and answers balance queries.

pub mod application {
    pub mod command_handlers;
    pub mod projector;
    pub mod query_handlers;
}

pub mod domain {
    pub mod aggregates;
    pub mod commands;
    pub mod events;
}
