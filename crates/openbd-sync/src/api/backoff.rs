//! Backoff state shared across the sub-batches of one fetch.
//!
//! `current_wait` starts at `base_wait`, doubles on every failure that is
//! retried and returns to `base_wait` on success; both are capped at
//! `max_wait`. A sub-batch that runs out of attempts leaves it unchanged.
//! The sleep after the n-th failed attempt of a sub-batch is
//! `current_wait * 1.5^n`, also capped. The same `current_wait` paces the
//! pause between sub-batches.

use shared::config::ApiConfig;
use std::time::Duration;

const GROWTH_PER_RETRY: f64 = 1.5;
const FAILURE_MULTIPLIER: u32 = 2;

/// Immutable retry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Attempts per sub-batch
    pub max_retries: u32,
    /// Initial and post-success wait
    pub base_wait: Duration,
    /// Cap for every wait
    pub max_wait: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base_wait: config.base_wait(),
            max_wait: config.max_wait().max(config.base_wait()),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

/// Mutable backoff state for one fetch
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current_wait: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current_wait: policy.base_wait,
        }
    }

    /// Wait used between sub-batches
    pub fn current_wait(&self) -> Duration {
        self.current_wait
    }

    /// Whether another attempt follows the failed attempt `retry_index`
    pub fn has_retry_after(&self, retry_index: u32) -> bool {
        retry_index + 1 < self.policy.max_retries
    }

    /// Record a failed attempt and return how long to sleep before the next
    pub fn on_failure(&mut self, retry_index: u32) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        let max = self.policy.max_wait;
        // Clamp in f64 first; the uncapped product can exceed Duration's range
        let secs = if self.current_wait.is_zero() {
            0.0
        } else {
            (self.current_wait.as_secs_f64() * GROWTH_PER_RETRY.powi(exponent))
                .min(max.as_secs_f64())
        };
        let sleep = self.cap(Duration::try_from_secs_f64(secs).unwrap_or(max));
        self.current_wait = self.cap(self.current_wait.saturating_mul(FAILURE_MULTIPLIER));
        sleep
    }

    /// Record a successful attempt
    pub fn on_success(&mut self) {
        self.current_wait = self.policy.base_wait;
    }

    fn cap(&self, wait: Duration) -> Duration {
        wait.min(self.policy.max_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            max_retries: 3,
            base_wait: Duration::from_millis(500),
            max_wait: Duration::from_secs(8),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy, self::policy());
    }

    #[test]
    fn test_failure_sequence() {
        let mut backoff = Backoff::new(policy());

        // 0.5 * 1.5^0, then wait doubles to 1.0
        assert_eq!(backoff.on_failure(0), Duration::from_millis(500));
        assert_eq!(backoff.current_wait(), Duration::from_secs(1));

        // 1.0 * 1.5^1, then wait doubles to 2.0
        assert_eq!(backoff.on_failure(1), Duration::from_millis(1500));
        assert_eq!(backoff.current_wait(), Duration::from_secs(2));
    }

    #[test]
    fn test_sleeps_are_monotonic_and_capped() {
        let mut backoff = Backoff::new(policy());
        let mut previous = Duration::ZERO;

        for retry_index in 0..10 {
            let sleep = backoff.on_failure(retry_index);
            assert!(sleep >= previous, "sleep shrank at retry {}", retry_index);
            assert!(sleep <= Duration::from_secs(8));
            previous = sleep;
        }

        assert_eq!(previous, Duration::from_secs(8));
        assert_eq!(backoff.current_wait(), Duration::from_secs(8));
    }

    #[test]
    fn test_success_resets_wait() {
        let mut backoff = Backoff::new(policy());
        backoff.on_failure(0);
        backoff.on_failure(1);
        assert!(backoff.current_wait() > Duration::from_millis(500));

        backoff.on_success();
        assert_eq!(backoff.current_wait(), Duration::from_millis(500));
        assert_eq!(backoff.on_failure(0), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_budget() {
        let backoff = Backoff::new(policy());
        assert!(backoff.has_retry_after(0));
        assert!(backoff.has_retry_after(1));
        assert!(!backoff.has_retry_after(2));
    }

    #[test]
    fn test_large_retry_index_stays_capped() {
        let mut backoff = Backoff::new(BackoffPolicy {
            max_retries: 200,
            ..policy()
        });

        for retry_index in 0..200 {
            assert!(backoff.on_failure(retry_index) <= Duration::from_secs(8));
        }
        assert_eq!(backoff.on_failure(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_zero_base_wait_never_sleeps_past_cap() {
        let mut backoff = Backoff::new(BackoffPolicy {
            max_retries: 3,
            base_wait: Duration::ZERO,
            max_wait: Duration::from_secs(8),
        });
        assert_eq!(backoff.on_failure(u32::MAX), Duration::ZERO);
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let config = ApiConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(BackoffPolicy::from_config(&config).max_retries, 1);
    }
}
