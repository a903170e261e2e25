//! Retry budget and back-off bounds for a single read.

use rand::Rng;
use std::time::Duration;

/// Attempts made by default before a racing read gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default lower bound of the wait between attempts.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_millis(1000);

/// Default upper bound of the wait between attempts.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(1500);

/// How many times a read is tried and how long to wait in between.
///
/// `max_attempts` counts the first try, so `0` and `1` both mean "try once".
/// Each wait is drawn uniformly from `[min_wait, max_wait]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, min_wait: DEFAULT_MIN_WAIT, max_wait: DEFAULT_MAX_WAIT }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_wait: Duration, max_wait: Duration) -> Self {
        Self { max_attempts, min_wait, max_wait }
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, ..Default::default() }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_wait(mut self, min_wait: Duration, max_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self.max_wait = max_wait;
        self
    }

    /// Attempt budget with the `0 => 1` floor applied.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Pick the next wait, uniformly within the configured bounds.
    ///
    /// Inverted bounds collapse to `min_wait`.
    pub fn next_wait(&self) -> Duration {
        if self.max_wait <= self.min_wait {
            return self.min_wait;
        }
        rand::thread_rng().gen_range(self.min_wait..=self.max_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.min_wait, DEFAULT_MIN_WAIT);
        assert_eq!(policy.max_wait, DEFAULT_MAX_WAIT);
    }

    #[test]
    fn test_builders_override_defaults() {
        let policy = RetryPolicy::default()
            .with_max_attempts(3)
            .with_wait(Duration::from_millis(5), Duration::from_millis(9));
        assert_eq!(policy, RetryPolicy::new(3, Duration::from_millis(5), Duration::from_millis(9)));

        let waits_only = RetryPolicy::no_retry().with_wait(Duration::ZERO, Duration::ZERO);
        assert_eq!(waits_only.attempt_budget(), 1);
        assert_eq!(waits_only.next_wait(), Duration::ZERO);
    }

    #[test]
    fn test_attempt_budget_floor() {
        assert_eq!(RetryPolicy::default().with_max_attempts(0).attempt_budget(), 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(1).attempt_budget(), 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(7).attempt_budget(), 7);
        assert_eq!(RetryPolicy::no_retry().attempt_budget(), 1);
    }

    #[test]
    fn test_next_wait_stays_in_bounds() {
        let policy = RetryPolicy::new(5, Duration::from_millis(20), Duration::from_millis(60));
        for _ in 0..500 {
            let wait = policy.next_wait();
            assert!(wait >= policy.min_wait && wait <= policy.max_wait, "{:?} out of bounds", wait);
        }
    }

    #[test]
    fn test_next_wait_degenerate_bounds() {
        let fixed = RetryPolicy::new(3, Duration::from_millis(50), Duration::from_millis(50));
        assert_eq!(fixed.next_wait(), Duration::from_millis(50));

        let inverted = RetryPolicy::new(3, Duration::from_millis(80), Duration::from_millis(10));
        assert_eq!(inverted.next_wait(), Duration::from_millis(80));

        let zero = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        assert_eq!(zero.next_wait(), Duration::ZERO);
    }
}
