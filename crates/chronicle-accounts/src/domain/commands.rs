//! Commands for the accounts context.

use std::any::Any;

use chronicle_core::command::{Command, CommandType};
use chronicle_core::event::AggregateType;
use uuid::Uuid;

use super::aggregates::ACCOUNT_AGGREGATE_TYPE;

/// Command type constant for `OpenAccount`.
pub const OPEN_ACCOUNT_COMMAND_TYPE: CommandType = CommandType::from_static("account.open");
/// Command type constant for `DepositMoney`.
pub const DEPOSIT_MONEY_COMMAND_TYPE: CommandType = CommandType::from_static("account.deposit");
/// Command type constant for `WithdrawMoney`.
pub const WITHDRAW_MONEY_COMMAND_TYPE: CommandType = CommandType::from_static("account.withdraw");

/// Command to open a new account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder.
    pub owner: String,
}

/// Command to pay money into an account.
#[derive(Debug, Clone)]
pub struct DepositMoney {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Command to take money out of an account.
#[derive(Debug, Clone)]
pub struct WithdrawMoney {
    /// The account identifier.
    pub account_id: Uuid,
    /// Amount in minor currency units.
    pub amount: i64,
}

macro_rules! account_command {
    ($name:ident, $command_type:expr) => {
        impl Command for $name {
            fn command_type(&self) -> CommandType {
                $command_type
            }

            fn aggregate_id(&self) -> Uuid {
                self.account_id
            }

            fn aggregate_type(&self) -> AggregateType {
                ACCOUNT_AGGREGATE_TYPE
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

account_command!(OpenAccount, OPEN_ACCOUNT_COMMAND_TYPE);
account_command!(DepositMoney, DEPOSIT_MONEY_COMMAND_TYPE);
account_command!(WithdrawMoney, WITHDRAW_MONEY_COMMAND_TYPE);
