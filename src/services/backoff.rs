//! Retry with exponential backoff
//!
//! Wraps any fallible async operation. Attempt `n` (zero-indexed) that fails
//! waits `base_delay * 2^n` before the next try; after `max_retries` retries
//! the last error is returned to the caller. The executor knows nothing about
//! HTTP or items, callers decide what counts as a failure.

use crate::constants::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES};
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Wait before the first retry
    pub base_delay: Duration,

    /// Upper bound of random jitter added to each wait (zero = none)
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Backoff before retrying after zero-indexed `attempt` failed, without jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Actual wait after zero-indexed `attempt` failed, jitter included
    pub fn wait_for(&self, attempt: u32) -> Duration {
        self.delay_for(attempt).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
        }
    }
}

/// Run `operation` until it succeeds or the policy's retries are exhausted.
///
/// `label` only shows up in the retry diagnostics.
pub async fn retry_with_backoff<T, E, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                let delay = policy.wait_for(attempt);
                warn!(
                    label = label,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    wait_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retry backoff"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    label = label,
                    attempts = attempt + 1,
                    error = %e,
                    "Retries exhausted"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5000));
        assert_eq!(policy.delay_for(0), Duration::from_millis(5000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(10000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20000));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(32), Duration::MAX);
        assert_eq!(policy.delay_for(64), Duration::MAX);

        let huge = RetryPolicy::new(3, Duration::MAX);
        assert_eq!(huge.delay_for(1), Duration::MAX);
    }

    #[test]
    fn test_wait_with_jitter_saturates() {
        let policy = RetryPolicy::new(3, Duration::MAX).with_jitter(Duration::from_millis(50));
        assert_eq!(policy.wait_for(0), Duration::MAX);
        assert_eq!(policy.wait_for(64), Duration::MAX);

        let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_jitter(Duration::from_millis(50));
        let wait = policy.wait_for(1);
        assert!(wait >= Duration::from_millis(200) && wait <= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_failures() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let start = Instant::now();

        let result: Result<u32, String> = retry_with_backoff("flaky", &policy, move || async move {
            let n = calls_ref.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(format!("failure {}", n))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Two waits: 100ms then 200ms
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(350), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_exhausts_retries() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let start = Instant::now();

        let result: Result<(), String> = retry_with_backoff("broken", &policy, move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Err("nope".to_string())
        })
        .await;

        assert_eq!(result, Err("nope".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        // 10 + 20 + 40
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(70), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(120), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let policy = RetryPolicy::new(0, Duration::from_secs(60));

        let result: Result<(), &str> = retry_with_backoff("once", &policy, move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Err("fail")
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_stays_within_bound() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;
        let policy = RetryPolicy::new(1, Duration::from_millis(100))
            .with_jitter(Duration::from_millis(50));
        let start = Instant::now();

        let _: Result<(), &str> = retry_with_backoff("jitter", &policy, move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Err("fail")
        })
        .await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(200));
    }
}
