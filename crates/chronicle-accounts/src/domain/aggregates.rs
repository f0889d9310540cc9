//! Aggregate roots for the accounts context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chronicle_core::aggregate::{Aggregate, AggregateBase};
use chronicle_core::command::Command;
use chronicle_core::context::Context;
use chronicle_core::error::{DomainError, RegistrationError};
use chronicle_core::event::{AggregateType, Clock, Event, EventType};
use chronicle_core::registry::AggregateRegistry;
use serde::Serialize;
use uuid::Uuid;

use super::commands::{DepositMoney, OpenAccount, WithdrawMoney};
use super::events::{
    ACCOUNT_OPENED_EVENT_TYPE, AccountEventKind, AccountOpened, MONEY_DEPOSITED_EVENT_TYPE,
    MONEY_WITHDRAWN_EVENT_TYPE, MoneyDeposited, MoneyWithdrawn,
};

/// Aggregate type of [`BankAccount`].
pub const ACCOUNT_AGGREGATE_TYPE: AggregateType = AggregateType::from_static("account");

/// The aggregate root for a bank account.
///
/// The balance may never go negative. Commands are validated against the
/// committed state only, so each command is decided on a freshly loaded
/// account.
pub struct BankAccount {
    base: AggregateBase,
    owner: Option<String>,
    balance: i64,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankAccount")
            .field("base", &self.base)
            .field("owner", &self.owner)
            .field("balance", &self.balance)
            .finish_non_exhaustive()
    }
}

impl BankAccount {
    /// Creates an unopened account whose events are stamped by `clock`.
    #[must_use]
    pub fn new(id: Uuid, clock: Arc<dyn Clock>) -> Self {
        Self {
            base: AggregateBase::new(ACCOUNT_AGGREGATE_TYPE, id),
            owner: None,
            balance: 0,
            clock,
        }
    }

    /// Returns the account holder, if the account has been opened.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the committed balance.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.balance
    }

    fn open(&mut self, command: &OpenAccount) -> Result<(), DomainError> {
        if self.owner.is_some() {
            return Err(DomainError::Validation(format!(
                "account {} is already open",
                self.base.entity_id()
            )));
        }
        let owner = command.owner.trim();
        if owner.is_empty() {
            return Err(DomainError::Validation("account owner must not be empty".into()));
        }
        self.record(
            ACCOUNT_OPENED_EVENT_TYPE,
            &AccountOpened {
                owner: owner.to_owned(),
            },
        )
    }

    fn deposit(&mut self, command: &DepositMoney) -> Result<(), DomainError> {
        self.require_open()?;
        require_positive(command.amount)?;
        credit(self.balance, command.amount)?;
        self.record(
            MONEY_DEPOSITED_EVENT_TYPE,
            &MoneyDeposited {
                amount: command.amount,
            },
        )
    }

    fn withdraw(&mut self, command: &WithdrawMoney) -> Result<(), DomainError> {
        self.require_open()?;
        require_positive(command.amount)?;
        if command.amount > self.balance {
            return Err(DomainError::Validation(format!(
                "insufficient funds in account {}: balance {}, requested {}",
                self.base.entity_id(),
                self.balance,
                command.amount
            )));
        }
        self.record(
            MONEY_WITHDRAWN_EVENT_TYPE,
            &MoneyWithdrawn {
                amount: command.amount,
            },
        )
    }

    fn require_open(&self) -> Result<(), DomainError> {
        if self.owner.is_none() {
            return Err(DomainError::Validation(format!(
                "account {} is not open",
                self.base.entity_id()
            )));
        }
        Ok(())
    }

    fn record<P: Serialize>(&mut self, event_type: EventType, payload: &P) -> Result<(), DomainError> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            DomainError::Infrastructure(format!("event serialization failed: {e}"))
        })?;
        let now = self.clock.now();
        self.base.append_event(event_type, payload, now);
        Ok(())
    }
}

fn require_positive(amount: i64) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Adds `amount` to `balance`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the result overflows `i64`.
pub fn credit(balance: i64, amount: i64) -> Result<i64, DomainError> {
    balance.checked_add(amount).ok_or_else(|| {
        DomainError::Validation(format!(
            "balance overflow: {balance} + {amount} exceeds {}",
            i64::MAX
        ))
    })
}

/// Subtracts `amount` from `balance`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the result overflows `i64`.
pub fn debit(balance: i64, amount: i64) -> Result<i64, DomainError> {
    balance.checked_sub(amount).ok_or_else(|| {
        DomainError::Validation(format!("balance overflow: {balance} - {amount}"))
    })
}

impl Aggregate for BankAccount {
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
        match AccountEventKind::decode(event)? {
            AccountEventKind::Opened(payload) => self.owner = Some(payload.owner),
            AccountEventKind::Deposited(payload) => {
                self.balance = credit(self.balance, payload.amount)?;
            }
            AccountEventKind::Withdrawn(payload) => {
                self.balance = debit(self.balance, payload.amount)?;
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, _ctx: &Context, command: &dyn Command) -> Result<(), DomainError> {
        let any = command.as_any();
        if let Some(open) = any.downcast_ref::<OpenAccount>() {
            self.open(open)
        } else if let Some(deposit) = any.downcast_ref::<DepositMoney>() {
            self.deposit(deposit)
        } else if let Some(withdraw) = any.downcast_ref::<WithdrawMoney>() {
            self.withdraw(withdraw)
        } else {
            Err(DomainError::Validation(format!(
                "account cannot handle command {}",
                command.command_type()
            )))
        }
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

/// Registers the `BankAccount` constructor, stamping events with `clock`.
///
/// # Errors
///
/// Returns `RegistrationError::DuplicateType` if accounts are already
/// registered.
pub fn register_account(
    registry: &mut AggregateRegistry,
    clock: Arc<dyn Clock>,
) -> Result<AggregateType, RegistrationError> {
    registry.register(move |id| Box::new(BankAccount::new(id, Arc::clone(&clock))))
}
