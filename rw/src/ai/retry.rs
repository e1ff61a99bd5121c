//! Bounded exponential-backoff retry around AI service calls
//!
//! A single fixed policy is applied uniformly to every call kind: the
//! operation is attempted once, and only transient failures (rate limiting,
//! temporary unavailability) are retried, doubling the delay each time.
//! No jitter, no circuit breaker. Any other failure, or the last transient
//! failure once the bound is reached, is returned unchanged.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::Transient;
use crate::config::RetryConfig;

/// Retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Retry policy: bound and base delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each subsequent retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        debug!(?config, "RetryPolicy::from_config: called");
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
    }

    /// Delay before the given retry (1-indexed): `base * 2^(retry - 1)`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        match 2u32.checked_pow(exponent) {
            Some(factor) => self.base_delay.saturating_mul(factor),
            None => Duration::MAX,
        }
    }

    /// Total attempts including the initial one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `op`, retrying transient failures according to `policy`
///
/// `label` names the call in log output.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    debug!(%label, ?policy, "with_retry: called");
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => {
                debug!(%label, attempts = retry + 1, "with_retry: success");
                return Ok(value);
            }
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                retry += 1;
                let delay = policy.delay_for(retry);
                warn!(
                    %label,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "with_retry: transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                debug!(%label, attempts = retry + 1, transient = e.is_transient(), error = %e, "with_retry: giving up");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient(u32),
        Permanent,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Transient(_))
        }
    }

    /// Records the instant of each attempt; fails transiently for the first `failures` calls
    async fn flaky(calls: Arc<Mutex<Vec<Instant>>>, failures: usize) -> Result<usize, TestError> {
        let n = {
            let mut calls = calls.lock().unwrap();
            calls.push(Instant::now());
            calls.len()
        };
        if n <= failures {
            Err(TestError::Transient(n as u32))
        } else {
            Ok(n)
        }
    }

    fn gaps(calls: &[Instant]) -> Vec<Duration> {
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(10),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(2));
        assert_eq!(policy.delay_for(80), Duration::MAX);
    }

    proptest! {
        #[test]
        fn prop_delay_is_base_times_power_of_two(base_ms in 1u64..10_000, retry in 1u32..16) {
            let policy = RetryPolicy::new(16, Duration::from_millis(base_ms));
            let expected = Duration::from_millis(base_ms * (1u64 << (retry - 1)));
            prop_assert_eq!(policy.delay_for(retry), expected);
            prop_assert_eq!(policy.delay_for(retry + 1), expected * 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_transient_failures_then_success() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let policy = RetryPolicy::default();

        let result = with_retry(&policy, "test", || flaky(Arc::clone(&calls), 3)).await;

        assert_eq!(result, Ok(4));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        let gaps = gaps(&calls);
        assert_close(gaps[0], Duration::from_secs(2));
        assert_close(gaps[1], Duration::from_secs(4));
        assert_close(gaps[2], Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_retries() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let policy = RetryPolicy::default();

        let result = with_retry(&policy, "test", || flaky(Arc::clone(&calls), usize::MAX)).await;

        // The last error is propagated unchanged
        assert_eq!(result, Err(TestError::Transient(4)));
        assert_eq!(calls.lock().unwrap().len(), policy.max_attempts() as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let calls = Arc::new(Mutex::new(0u32));
        let policy = RetryPolicy::default();
        let start = Instant::now();

        let result: Result<(), TestError> = with_retry(&policy, "test", || {
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().unwrap() += 1;
                Err(TestError::Permanent)
            }
        })
        .await;

        assert_eq!(result, Err(TestError::Permanent));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_then_permanent_stops() {
        let calls = Arc::new(Mutex::new(0u32));
        let policy = RetryPolicy::default();

        let result: Result<(), TestError> = with_retry(&policy, "test", || {
            let calls = Arc::clone(&calls);
            async move {
                let mut n = calls.lock().unwrap();
                *n += 1;
                if *n == 1 { Err(TestError::Transient(1)) } else { Err(TestError::Permanent) }
            }
        })
        .await;

        assert_eq!(result, Err(TestError::Permanent));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let policy = RetryPolicy::new(0, Duration::from_millis(1));

        let result = with_retry(&policy, "test", || flaky(Arc::clone(&calls), 1)).await;

        assert_eq!(result, Err(TestError::Transient(1)));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }
}
