//! Chronicle demo entry point.

use std::error::Error;

use chronicle_demo::config::DemoConfig;
use chronicle_demo::runtime::{Runtime, drain_observer_failures, run_scenario};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Chronicle demo");

    // Read configuration from environment.
    let config = DemoConfig::from_env()?;
    tracing::info!(
        namespace = %config.namespace,
        poll_interval_ms = u64::try_from(config.poll.initial_interval.as_millis()).unwrap_or(u64::MAX),
        read_timeout_ms = u64::try_from(config.read_timeout.as_millis()).unwrap_or(u64::MAX),
        "configuration loaded"
    );

    let settle = config.poll.max_interval;
    let runtime = Runtime::new(config)?;
    let mut failures = runtime.observer_failures();

    let report = run_scenario(&runtime).await?;
    for balance in &report.balances {
        tracing::info!(
            account_id = %balance.account_id,
            owner = %balance.owner,
            balance = balance.balance,
            version = balance.version,
            "account balance"
        );
    }

    let failed_projections = drain_observer_failures(&mut failures, settle).await;
    tracing::info!(
        total = report.total,
        rejected = report.rejected,
        failed_projections,
        "scenario complete"
    );

    Ok(())
}
