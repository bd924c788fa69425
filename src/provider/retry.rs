use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::WizardError;

/// Exponential backoff: the wait after failed attempt `n` (zero-based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or retries run out.
/// The closure receives the zero-based attempt number.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, WizardError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, WizardError>>,
{
    let mut attempt = 0u32;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                warn!(label, attempt, error = %e, ?delay, "request failed, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
                debug!(label, attempt, "retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy { max_retries, base_delay: Duration::ZERO }
    }

    #[test]
    fn delays_double_from_base() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(0), Duration::from_secs(1));
        assert_eq!(p.delay_for(1), Duration::from_secs(2));
        assert_eq!(p.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let out = with_retry(&fast(3), "test", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(WizardError::Http { status: 502, body: "bad gateway".into() })
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries_with_last_error() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast(2), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>(WizardError::Provider(format!("attempt {attempt}"))) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.to_string(), "provider error: attempt 2");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast(3), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(WizardError::Http { status: 401, body: "no key".into() }) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, WizardError::Http { status: 401, .. }));
    }
}
