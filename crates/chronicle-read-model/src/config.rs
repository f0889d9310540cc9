//! Polling cadence for min-version reads.

use std::time::Duration;

/// How a [`VersionedRepository`](crate::VersionedRepository) polls while
/// waiting for an entity to catch up.
///
/// The wait starts at `initial_interval` and grows by `multiplier` after
/// each miss, capped at `max_interval`. `default_timeout` bounds the wait
/// when the context carries no deadline of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// First sleep between attempts.
    pub initial_interval: Duration,
    /// Upper bound on the sleep between attempts.
    pub max_interval: Duration,
    /// Growth factor applied after each miss.
    pub multiplier: u32,
    /// Bound on the whole wait when the context has no deadline.
    pub default_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(100),
            multiplier: 2,
            default_timeout: Duration::from_secs(10),
        }
    }
}

impl PollConfig {
    /// Returns the sleep that follows `current`.
    #[must_use]
    pub fn next_interval(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.multiplier.max(1))
            .min(self.max_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_interval_grows_then_caps() {
        let config = PollConfig::default();

        let mut interval = config.initial_interval;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(interval.as_millis());
            interval = config.next_interval(interval);
        }

        assert_eq!(seen, vec![5, 10, 20, 40, 80, 100]);
    }

    #[test]
    fn test_zero_multiplier_keeps_interval_constant() {
        let config = PollConfig {
            multiplier: 0,
            ..PollConfig::default()
        };

        assert_eq!(
            config.next_interval(Duration::from_millis(7)),
            Duration::from_millis(7)
        );
    }
}
