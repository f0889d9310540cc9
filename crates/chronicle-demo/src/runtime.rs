//! The in-memory runtime the demo drives, and the scenario it runs.

use std::sync::Arc;
use std::time::Duration;

use chronicle_accounts::application::command_handlers::route_account_commands;
use chronicle_accounts::application::projector::{AccountBalance, balance_projector_handler};
use chronicle_accounts::application::query_handlers::{
    get_account_balance, list_account_balances, total_holdings,
};
use chronicle_accounts::domain::aggregates::{ACCOUNT_AGGREGATE_TYPE, register_account};
use chronicle_accounts::domain::commands::{DepositMoney, OpenAccount, WithdrawMoney};
use chronicle_aggregate_store::{CommandRouter, EventSourcedAggregateStore};
use chronicle_core::bus::EventBus;
use chronicle_core::command::{Command, CommandHandler};
use chronicle_core::context::{Context, ContextCodec};
use chronicle_core::error::DomainError;
use chronicle_core::event::SystemClock;
use chronicle_core::matcher::Matcher;
use chronicle_core::registry::AggregateRegistry;
use chronicle_core::repository::ReadRepository;
use chronicle_core::store::{AggregateStore, EventStore};
use chronicle_event_bus::{LocalEventBus, ObserverFailure};
use chronicle_event_store::MemoryEventStore;
use chronicle_read_model::{MemoryRepository, VersionedRepository};
use chronicle_tracing::{
    TracingAggregateStore, TracingEventBus, TracingEventStore, command_tracing_middleware,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::config::DemoConfig;
use crate::error::AppError;

/// The full write and read pipeline for bank accounts.
///
/// Commands are routed to the account aggregate, whose events are stored,
/// then published on the bus. The balance projector observes the bus
/// asynchronously, so reads pass the version of the write they follow.
pub struct Runtime {
    config: DemoConfig,
    bus: Arc<LocalEventBus>,
    commands: Arc<dyn CommandHandler>,
    aggregates: Arc<dyn AggregateStore>,
    balances: Arc<dyn ReadRepository<AccountBalance>>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Wires every component, each wrapped in its tracing decorator.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Registration` if any registration is rejected.
    pub fn new(config: DemoConfig) -> Result<Self, AppError> {
        let events: Arc<dyn EventStore> =
            Arc::new(TracingEventStore::new(Arc::new(MemoryEventStore::new())));
        let bus = Arc::new(LocalEventBus::new());
        let traced_bus = Arc::new(TracingEventBus::new(bus.clone()));

        let mut registry = AggregateRegistry::new();
        register_account(&mut registry, Arc::new(SystemClock))?;
        let store = EventSourcedAggregateStore::new(events, Arc::new(registry))
            .with_publisher(traced_bus.clone())
            .with_context_codec(Arc::new(ContextCodec::default()));
        let aggregates: Arc<dyn AggregateStore> =
            Arc::new(TracingAggregateStore::new(Arc::new(store)));

        let projected: Arc<dyn ReadRepository<AccountBalance>> = Arc::new(MemoryRepository::new());
        let balances: Arc<dyn ReadRepository<AccountBalance>> =
            Arc::new(VersionedRepository::with_config(projected, config.poll));
        traced_bus.add_observer(
            Matcher::aggregate(ACCOUNT_AGGREGATE_TYPE),
            Arc::new(balance_projector_handler(balances.clone())),
        )?;

        let mut router = CommandRouter::new();
        route_account_commands(
            &mut router,
            aggregates.clone(),
            &[command_tracing_middleware()],
        )?;

        Ok(Self {
            config,
            bus,
            commands: Arc::new(router),
            aggregates,
            balances,
        })
    }

    /// Returns the context every request of this runtime starts from.
    #[must_use]
    pub fn context(&self) -> Context {
        Context::background().with_namespace(&self.config.namespace)
    }

    /// Subscribes to projection failures reported by the bus.
    #[must_use]
    pub fn observer_failures(&self) -> broadcast::Receiver<ObserverFailure> {
        self.bus.errors()
    }

    /// Handles `command` and returns the account version after it.
    ///
    /// # Errors
    ///
    /// Returns the command's `DomainError` if it is rejected.
    pub async fn execute(&self, command: &dyn Command) -> Result<i64, DomainError> {
        let ctx = self.context();
        self.commands.handle_command(&ctx, command).await?;
        let account = self
            .aggregates
            .load(&ctx, &ACCOUNT_AGGREGATE_TYPE, command.aggregate_id())
            .await?;
        Ok(account.version())
    }

    /// Reads an account's balance once it reflects `min_version`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Timeout` if the projection does not catch up
    /// within the configured read timeout.
    pub async fn balance(
        &self,
        account_id: Uuid,
        min_version: i64,
    ) -> Result<AccountBalance, DomainError> {
        let ctx = self
            .context()
            .with_min_version(min_version)
            .with_timeout(self.config.read_timeout);
        get_account_balance(&ctx, account_id, self.balances.as_ref()).await
    }
}

/// Counts observer failures until none arrives for `settle`.
///
/// Observers run detached, so failures from a publish may still be on
/// their way when the publishing call returns.
pub async fn drain_observer_failures(
    failures: &mut broadcast::Receiver<ObserverFailure>,
    settle: Duration,
) -> usize {
    let mut count = 0_usize;
    loop {
        match tokio::time::timeout(settle, failures.recv()).await {
            Ok(Ok(failure)) => {
                tracing::warn!(
                    handler_type = %failure.handler_type,
                    event = %failure.event,
                    error = %failure.error,
                    "projection failed"
                );
                count += 1;
            }
            Ok(Err(RecvError::Lagged(missed))) => {
                count = count.saturating_add(usize::try_from(missed).unwrap_or(usize::MAX));
            }
            Ok(Err(RecvError::Closed)) | Err(_) => return count,
        }
    }
}

/// What the demo scenario observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Every projected balance, ordered by owner.
    pub balances: Vec<AccountBalance>,
    /// Sum of all balances.
    pub total: i64,
    /// Commands the accounts refused.
    pub rejected: usize,
}

/// Opens two accounts, moves money, attempts an overdraft, and reads the
/// results back through the projection.
///
/// # Errors
///
/// Returns `AppError::Domain` for any failure other than the expected
/// overdraft rejection.
pub async fn run_scenario(runtime: &Runtime) -> Result<ScenarioReport, AppError> {
    let ada = Uuid::new_v4();
    let grace = Uuid::new_v4();

    runtime
        .execute(&OpenAccount {
            account_id: ada,
            owner: "Ada".into(),
        })
        .await?;
    runtime
        .execute(&OpenAccount {
            account_id: grace,
            owner: "Grace".into(),
        })
        .await?;
    runtime
        .execute(&DepositMoney {
            account_id: ada,
            amount: 100,
        })
        .await?;
    let grace_version = runtime
        .execute(&DepositMoney {
            account_id: grace,
            amount: 50,
        })
        .await?;
    let ada_version = runtime
        .execute(&WithdrawMoney {
            account_id: ada,
            amount: 30,
        })
        .await?;

    let mut rejected = 0;
    let overdraft = WithdrawMoney {
        account_id: grace,
        amount: 500,
    };
    match runtime.execute(&overdraft).await {
        Err(DomainError::Validation(reason)) => {
            tracing::warn!(account_id = %grace, %reason, "withdrawal rejected");
            rejected += 1;
        }
        Err(other) => return Err(other.into()),
        Ok(_) => {}
    }

    let ada_balance = runtime.balance(ada, ada_version).await?;
    let grace_balance = runtime.balance(grace, grace_version).await?;
    tracing::info!(
        ada = ada_balance.balance,
        grace = grace_balance.balance,
        "balances caught up"
    );

    let ctx = runtime.context();
    let balances = list_account_balances(&ctx, runtime.balances.as_ref()).await?;
    let total = total_holdings(&ctx, runtime.balances.as_ref()).await?;
    Ok(ScenarioReport {
        balances,
        total,
        rejected,
    })
}
