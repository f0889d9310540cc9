//! Domain events for the accounts context.

use chronicle_core::error::DomainError;
use chronicle_core::event::{Event, EventType};
use serde::{Deserialize, Serialize};

/// Event type constant for `AccountOpened`.
pub const ACCOUNT_OPENED_EVENT_TYPE: EventType = EventType::from_static("account.opened");
/// Event type constant for `MoneyDeposited`.
pub const MONEY_DEPOSITED_EVENT_TYPE: EventType = EventType::from_static("account.deposited");
/// Event type constant for `MoneyWithdrawn`.
pub const MONEY_WITHDRAWN_EVENT_TYPE: EventType = EventType::from_static("account.withdrawn");

/// Emitted when an account is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    /// Name of the account holder.
    pub owner: String,
}

/// Emitted when money is paid into an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyDeposited {
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Emitted when money is taken out of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyWithdrawn {
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Typed view of an account event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEventKind {
    /// The account has been opened.
    Opened(AccountOpened),
    /// Money has been deposited.
    Deposited(MoneyDeposited),
    /// Money has been withdrawn.
    Withdrawn(MoneyWithdrawn),
}

impl AccountEventKind {
    /// Decodes the payload of a stored account event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an event type this context does
    /// not produce, and `DomainError::Infrastructure` for a malformed payload.
    pub fn decode(event: &Event) -> Result<Self, DomainError> {
        let kind = &event.event_type;
        if *kind == ACCOUNT_OPENED_EVENT_TYPE {
            event.decode_payload().map(Self::Opened)
        } else if *kind == MONEY_DEPOSITED_EVENT_TYPE {
            event.decode_payload().map(Self::Deposited)
        } else if *kind == MONEY_WITHDRAWN_EVENT_TYPE {
            event.decode_payload().map(Self::Withdrawn)
        } else {
            Err(DomainError::Validation(format!(
                "unknown account event type {kind}"
            )))
        }
    }
}
