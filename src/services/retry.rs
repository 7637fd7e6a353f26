//! Exponential backoff for transient API failures

use std::time::Duration;

use crate::config::RetrySettings;

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then try again
    Retry { delay: Duration },
    /// Stop and surface the error
    Abort,
}

/// Bounded retry policy with doubling delays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Decide after the `attempt`-th failure (1-based) of a transient error
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt > self.max_retries {
            return RetryDecision::Abort;
        }
        RetryDecision::Retry {
            delay: self.delay_for(attempt),
        }
    }

    /// `base * 2^(attempt - 1)`, capped at the maximum delay
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.base_delay
            .checked_mul(1 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_retries,
            Duration::from_secs(settings.base_delay_secs),
            Duration::from_secs(settings.max_delay_secs),
        )
    }
}
