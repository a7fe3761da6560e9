//! Bounded retry with exponential backoff

use justice_application::{BackendError, BackendErrorKind};
use justice_domain::{BackendDescriptor, BackendId, BackoffSettings};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Retry policy derived from a [`BackendDescriptor`].
///
/// `max_attempts` counts every upstream request, the first one included.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    backend: BackendId,
    max_attempts: u32,
    backoff: BackoffSettings,
}

impl RetryPolicy {
    pub fn for_descriptor(descriptor: &BackendDescriptor) -> Self {
        Self {
            backend: descriptor.id,
            max_attempts: descriptor.max_retries.max(1),
            backoff: descriptor.backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before attempt `attempt + 1` after a failure of `kind`.
    ///
    /// Rate limits start at `rate_limit_base`; everything else retryable
    /// starts at `transient_base`. Both double on every further attempt.
    pub fn delay(&self, kind: BackendErrorKind, attempt: u32) -> Duration {
        let base = match kind {
            BackendErrorKind::RateLimited => self.backoff.rate_limit_base,
            _ => self.backoff.transient_base,
        };
        base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are spent. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, BackendError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            let outcome = op(attempt).await;
            let latency_ms = started.elapsed().as_millis() as u64;

            let err = match outcome {
                Ok(value) => {
                    debug!(backend = %self.backend, attempt, latency_ms, "Backend call succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                warn!(
                    backend = %self.backend,
                    attempt,
                    latency_ms,
                    kind = %err.kind,
                    "Backend call failed: {}",
                    err
                );
                return Err(err);
            }

            if attempt >= self.max_attempts {
                warn!(
                    backend = %self.backend,
                    attempt,
                    latency_ms,
                    kind = %err.kind,
                    "Giving up after {} attempts: {}",
                    attempt,
                    err
                );
                let message = if attempt > 1 {
                    format!("{} after {} attempts", err.message, attempt)
                } else {
                    err.message
                };
                return Err(BackendError::new(err.kind, message));
            }

            let wait = self.delay(err.kind, attempt);
            info!(
                backend = %self.backend,
                attempt,
                latency_ms,
                kind = %err.kind,
                wait_ms = wait.as_millis() as u64,
                "{}, retrying",
                err
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        let descriptor = BackendDescriptor::new(BackendId::Gemini, "http://unused", "m")
            .with_max_retries(max_retries)
            .with_backoff(BackoffSettings {
                rate_limit_base: Duration::from_millis(2),
                transient_base: Duration::from_millis(1),
            });
        RetryPolicy::for_descriptor(&descriptor)
    }

    #[test]
    fn test_delay_doubles() {
        let p = RetryPolicy::for_descriptor(&BackendDescriptor::new(
            BackendId::Gemini,
            "http://unused",
            "m",
        ));
        assert_eq!(p.delay(BackendErrorKind::RateLimited, 1), Duration::from_secs(2));
        assert_eq!(p.delay(BackendErrorKind::RateLimited, 2), Duration::from_secs(4));
        assert_eq!(p.delay(BackendErrorKind::Timeout, 1), Duration::from_secs(1));
        assert_eq!(p.delay(BackendErrorKind::Transient, 3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(3)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BackendError::timeout("Request timeout")) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.kind, BackendErrorKind::Timeout);
        assert_eq!(err.message, "Request timeout after 3 attempts");
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(3)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BackendError::unauthenticated("bad key")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().message, "bad key");
    }

    #[tokio::test]
    async fn test_recovers_after_rate_limit() {
        let result = policy(3)
            .run(|attempt| async move {
                if attempt == 1 {
                    Err(BackendError::rate_limited("Rate limit exceeded"))
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        assert_eq!(policy(0).max_attempts(), 1);
    }
}
