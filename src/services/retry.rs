use std::{future::Future, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

static RETRY_DELAY_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"retry_delay\s*\{\s*seconds:\s*(\d+)")
            .expect("retry_delay pattern is a valid regex"),
        Regex::new(r#""?retryDelay"?\s*:\s*"(\d+)(?:\.\d+)?s""#)
            .expect("retryDelay pattern is a valid regex"),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based) after a rate-limit error.
    pub fn backoff_delay(&self, retry: u32, suggested: Option<Duration>) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let computed = self.base_delay.saturating_mul(1u32 << exponent);
        match suggested {
            Some(suggested) if suggested > computed => suggested,
            _ => computed,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(6))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    RateLimited { suggested: Option<Duration> },
    Transient,
    Permanent,
}

impl AppError {
    pub fn retry_disposition(&self) -> RetryDisposition {
        match self {
            AppError::RateLimited(message) => RetryDisposition::RateLimited {
                suggested: suggested_retry_delay(message),
            },
            AppError::Upstream(_) | AppError::ExternalService(_) => RetryDisposition::Transient,
            _ => RetryDisposition::Permanent,
        }
    }
}

/// Provider-suggested wait parsed from an error message, if any.
pub fn suggested_retry_delay(message: &str) -> Option<Duration> {
    RETRY_DELAY_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(message)
            .and_then(|captures| captures.get(1))
            .and_then(|seconds| seconds.as_str().parse::<u64>().ok())
            .map(Duration::from_secs)
    })
}

/// Runs `operation` until it succeeds, fails permanently, or the policy's
/// retries are spent. Rate-limited failures back off exponentially; other
/// transient failures wait the base delay.
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    label: &str,
    classify: C,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryDisposition,
    E: std::fmt::Display,
{
    let mut retry = 0;
    loop {
        log::debug!("{}: attempt {}/{}", label, retry + 1, policy.max_retries + 1);
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let disposition = classify(&err);
        if disposition == RetryDisposition::Permanent {
            return Err(err);
        }
        if retry >= policy.max_retries {
            log::warn!("{}: giving up after {} attempts: {}", label, retry + 1, err);
            return Err(err);
        }
        retry += 1;

        let delay = match disposition {
            RetryDisposition::RateLimited { suggested } => {
                let delay = policy.backoff_delay(retry, suggested);
                log::warn!("{}: rate limited, retrying in {:?}", label, delay);
                delay
            }
            _ => {
                log::warn!("{}: {}, retrying in {:?}", label, err, policy.base_delay);
                policy.base_delay
            }
        };
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::ZERO)
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = RetryPolicy::new(5, Duration::from_secs(6));

        assert_eq!(policy.backoff_delay(1, None), Duration::from_secs(6));
        assert_eq!(policy.backoff_delay(2, None), Duration::from_secs(12));
        assert_eq!(policy.backoff_delay(4, None), Duration::from_secs(48));
    }

    #[test]
    fn suggested_delay_wins_only_when_larger() {
        let policy = RetryPolicy::new(5, Duration::from_secs(6));

        assert_eq!(
            policy.backoff_delay(1, Some(Duration::from_secs(30))),
            Duration::from_secs(30)
        );
        assert_eq!(
            policy.backoff_delay(3, Some(Duration::from_secs(10))),
            Duration::from_secs(24)
        );
    }

    #[test]
    fn parses_suggested_delay_formats() {
        assert_eq!(
            suggested_retry_delay("429 Quota exceeded retry_delay {\n  seconds: 17\n}"),
            Some(Duration::from_secs(17))
        );
        assert_eq!(
            suggested_retry_delay(r#"{"@type": "RetryInfo", "retryDelay": "41s"}"#),
            Some(Duration::from_secs(41))
        );
        assert_eq!(suggested_retry_delay("plain failure"), None);
    }

    #[test]
    fn disposition_follows_error_kind() {
        assert_eq!(
            AppError::RateLimited("retry_delay { seconds: 3 }".into()).retry_disposition(),
            RetryDisposition::RateLimited {
                suggested: Some(Duration::from_secs(3))
            }
        );
        assert_eq!(
            AppError::Upstream("reset".into()).retry_disposition(),
            RetryDisposition::Transient
        );
        assert_eq!(
            AppError::MalformedResponse("bad".into()).retry_disposition(),
            RetryDisposition::Permanent
        );
    }

    #[actix_web::test]
    async fn retries_transient_errors_until_exhausted() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), AppError> = retry_with_backoff(
            &instant_policy(3),
            "test",
            AppError::retry_disposition,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Upstream("unavailable".into())) }
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[actix_web::test]
    async fn permanent_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), AppError> = retry_with_backoff(
            &instant_policy(3),
            "test",
            AppError::retry_disposition,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::ValidationError("bad input".into())) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn succeeds_after_rate_limit() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(
            &instant_policy(5),
            "test",
            AppError::retry_disposition,
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(AppError::RateLimited("429 quota".into()))
                    } else {
                        Ok("done")
                    }
                }
            },
        )
        .await;

        assert_eq!(result.ok(), Some("done"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
