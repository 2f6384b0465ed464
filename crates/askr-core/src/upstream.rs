//! Guarded upstream calls
//!
//! Every call to the structured store, the search index or the LLM goes
//! through an [`UpstreamGuard`], which bounds it with a timeout and, when a
//! [`RetryPolicy`] allows, retries transient failures with jittered
//! exponential backoff. Dropping the returned future cancels the in-flight
//! call.

use crate::error::{UpstreamFailure, UpstreamSource};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Bounded retry with full jitter
///
/// The default performs no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff base in milliseconds
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Policy that never retries
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// With max retries
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// With backoff bounds
    #[inline]
    #[must_use]
    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        self.max_delay_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Upper bound of the backoff before retry number `attempt` (0-based)
    #[must_use]
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(32)).unwrap_or(u64::MAX);
        let ceiling = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ceiling)
    }

    /// Jittered delay before retry number `attempt`, uniform in `0..=ceiling`
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = u64::try_from(self.backoff_ceiling(attempt).as_millis()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

/// Timeout + retry wrapper for calls to one upstream collaborator
#[derive(Debug, Clone, Copy)]
pub struct UpstreamGuard {
    upstream: UpstreamSource,
    timeout: Duration,
    retry: RetryPolicy,
}

impl UpstreamGuard {
    /// Create guard with no retries
    #[inline]
    #[must_use]
    pub fn new(upstream: UpstreamSource, timeout: Duration) -> Self {
        Self {
            upstream,
            timeout,
            retry: RetryPolicy::none(),
        }
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Guarded collaborator
    #[inline]
    #[must_use]
    pub fn upstream(&self) -> UpstreamSource {
        self.upstream
    }

    /// Configured bound per attempt
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `op`, bounding each attempt by the timeout
    ///
    /// `op` is invoked once per attempt.
    ///
    /// # Errors
    /// Returns the last failure once retries are exhausted or the failure is
    /// not retryable
    pub async fn call<T, E, F, Fut>(&self, mut op: F) -> Result<T, UpstreamFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<UpstreamFailure>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(UpstreamFailure::Timeout {
                    upstream: self.upstream,
                    after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(failure) if attempt < self.retry.max_retries && failure.is_retryable() => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        upstream = %self.upstream,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %failure,
                        "Retrying upstream call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    metrics::counter!(
                        "askr_upstream_failures_total",
                        "source" => self.upstream.as_str()
                    )
                    .increment(1);
                    return Err(failure);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn transport(upstream: UpstreamSource) -> UpstreamFailure {
        UpstreamFailure::Transport {
            upstream,
            message: "connection reset".into(),
        }
    }

    #[test]
    fn backoff_ceiling_grows_and_caps() {
        let policy = RetryPolicy::none()
            .with_max_retries(5)
            .with_delays(Duration::from_millis(100), Duration::from_millis(500));

        assert_eq!(policy.backoff_ceiling(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_ceiling(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_ceiling(3), Duration::from_millis(500));
        assert_eq!(policy.backoff_ceiling(60), Duration::from_millis(500));
    }

    #[test]
    fn backoff_is_within_ceiling() {
        let policy = RetryPolicy::default();
        for attempt in 0..8 {
            assert!(policy.backoff(attempt) <= policy.backoff_ceiling(attempt));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let guard = UpstreamGuard::new(UpstreamSource::Llm, Duration::from_millis(50));

        let result: Result<(), UpstreamFailure> = guard
            .call(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, UpstreamFailure>(())
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            UpstreamFailure::Timeout {
                upstream: UpstreamSource::Llm,
                after_ms: 50
            }
        );
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let guard = UpstreamGuard::new(UpstreamSource::SearchIndex, Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = guard
            .call(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(transport(UpstreamSource::SearchIndex))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let guard = UpstreamGuard::new(UpstreamSource::SearchIndex, Duration::from_secs(1))
            .with_retry(RetryPolicy::none().with_max_retries(2));
        let calls = Arc::new(AtomicU32::new(0));

        let result = guard
            .call(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(transport(UpstreamSource::SearchIndex))
                    } else {
                        Ok("hits")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "hits");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let guard = UpstreamGuard::new(UpstreamSource::Llm, Duration::from_secs(1))
            .with_retry(RetryPolicy::none().with_max_retries(3));
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = guard
            .call(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(UpstreamFailure::Status {
                        upstream: UpstreamSource::Llm,
                        status: 401,
                        message: "bad key".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(UpstreamFailure::Status { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
