//! The account balance read model and its projector.

use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::handler::HandlerType;
use chronicle_core::repository::{Entity, ReadRepository, Versionable};
use chronicle_read_model::{Projector, ProjectorHandler};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{ACCOUNT_AGGREGATE_TYPE, credit, debit};
use crate::domain::events::AccountEventKind;

/// Read-only view of an account's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    /// The account identifier.
    pub account_id: Uuid,
    /// Name of the account holder; empty until the account is opened.
    pub owner: String,
    /// Balance in minor currency units.
    pub balance: i64,
    /// Version of the last account event projected into this view.
    pub version: i64,
}

impl AccountBalance {
    /// Returns the view of an account no event has been projected into.
    #[must_use]
    pub fn empty(account_id: Uuid) -> Self {
        Self {
            account_id,
            owner: String::new(),
            balance: 0,
            version: 0,
        }
    }
}

impl Entity for AccountBalance {
    fn entity_id(&self) -> Uuid {
        self.account_id
    }
}

impl Versionable for AccountBalance {
    fn aggregate_version(&self) -> i64 {
        self.version
    }
}

/// Folds account events into [`AccountBalance`] views.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceProjector;

#[async_trait]
impl Projector<AccountBalance> for BalanceProjector {
    fn projector_type(&self) -> HandlerType {
        HandlerType::from_static("account_balance_projector")
    }

    async fn project(
        &self,
        _ctx: &Context,
        event: &Event,
        mut entity: AccountBalance,
    ) -> Result<Option<AccountBalance>, DomainError> {
        match AccountEventKind::decode(event)? {
            AccountEventKind::Opened(opened) => entity.owner = opened.owner,
            AccountEventKind::Deposited(deposited) => {
                entity.balance = credit(entity.balance, deposited.amount)?;
            }
            AccountEventKind::Withdrawn(withdrawn) => {
                entity.balance = debit(entity.balance, withdrawn.amount)?;
            }
        }
        entity.version = event.version;
        Ok(Some(entity))
    }
}

/// Builds the event handler that keeps `repo` in step with account events.
///
/// `repo` should honour the context min version (normally a
/// `VersionedRepository`) so that events delivered out of order wait for
/// their predecessor.
#[must_use]
pub fn balance_projector_handler(
    repo: Arc<dyn ReadRepository<AccountBalance>>,
) -> ProjectorHandler<AccountBalance> {
    ProjectorHandler::new(
        ACCOUNT_AGGREGATE_TYPE,
        Arc::new(BalanceProjector),
        repo,
        Arc::new(AccountBalance::empty),
    )
}
