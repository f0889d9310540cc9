//! Configuration read from the environment.

use std::time::Duration;

use chronicle_core::context::DEFAULT_NAMESPACE;
use chronicle_read_model::PollConfig;

use crate::error::AppError;

/// Namespace the demo writes into.
pub const NAMESPACE_VAR: &str = "CHRONICLE_NAMESPACE";
/// First poll interval of min-version reads, in milliseconds.
pub const POLL_INTERVAL_VAR: &str = "CHRONICLE_POLL_INTERVAL_MS";
/// Upper bound on the poll interval, in milliseconds.
pub const POLL_MAX_INTERVAL_VAR: &str = "CHRONICLE_POLL_MAX_INTERVAL_MS";
/// Deadline of each min-version read, in milliseconds.
pub const READ_TIMEOUT_VAR: &str = "CHRONICLE_READ_TIMEOUT_MS";

/// Runtime settings for the demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Namespace every command and query runs in.
    pub namespace: String,
    /// Poll cadence of the balance read model.
    pub poll: PollConfig,
    /// Deadline applied to reads that wait for a min version.
    pub read_timeout: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            read_timeout: poll.default_timeout,
            poll,
        }
    }
}

impl DemoConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; unset variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(namespace) = lookup(NAMESPACE_VAR) {
            if namespace.trim().is_empty() {
                return Err(AppError::Config {
                    key: NAMESPACE_VAR,
                    value: namespace,
                    reason: "must not be empty".into(),
                });
            }
            config.namespace = namespace;
        }
        if let Some(ms) = millis(&lookup, POLL_INTERVAL_VAR)? {
            config.poll.initial_interval = ms;
        }
        if let Some(ms) = millis(&lookup, POLL_MAX_INTERVAL_VAR)? {
            config.poll.max_interval = ms;
        }
        if let Some(ms) = millis(&lookup, READ_TIMEOUT_VAR)? {
            config.read_timeout = ms;
            config.poll.default_timeout = ms;
        }

        if config.poll.initial_interval > config.poll.max_interval {
            return Err(AppError::Config {
                key: POLL_INTERVAL_VAR,
                value: config.poll.initial_interval.as_millis().to_string(),
                reason: format!(
                    "must not exceed {POLL_MAX_INTERVAL_VAR} ({}ms)",
                    config.poll.max_interval.as_millis()
                ),
            });
        }
        Ok(config)
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let ms: u64 = raw.trim().parse().map_err(|e| AppError::Config {
        key,
        value: raw.clone(),
        reason: format!("must be a whole number of milliseconds: {e}"),
    })?;
    if ms == 0 {
        return Err(AppError::Config {
            key,
            value: raw,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Some(Duration::from_millis(ms)))
}
