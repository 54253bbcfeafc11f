//! Retrying requests the remote service throttled with HTTP 429.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Backoff applied while the remote service keeps answering 429.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RateLimitPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Server-provided `Retry-After` wins; otherwise `base_delay * 2^attempt`.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after.unwrap_or_else(|| {
            let multiplier = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
            self.base_delay.saturating_mul(multiplier)
        });
        delay.min(self.max_delay)
    }
}

/// A response that may carry a throttling signal.
pub trait Throttled {
    fn is_throttled(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
}

impl Throttled for reqwest::Response {
    fn is_throttled(&self) -> bool {
        self.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after(&self) -> Option<Duration> {
        self.headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after)
    }
}

/// Only integer seconds are honoured.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Send a request, resending while it is throttled and retries remain.
///
/// The last throttled response is returned as-is once retries run out so the
/// caller can turn it into an error.
pub async fn send_with_rate_limit<R, E, F, Fut>(
    policy: &RateLimitPolicy,
    operation: &str,
    send: F,
) -> Result<R, E>
where
    R: Throttled,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let mut attempt = 0;
    let mut response = send().await?;

    while response.is_throttled() && attempt < policy.max_retries {
        let delay = policy.delay(attempt, response.retry_after());
        warn!(
            operation = operation,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "rate limited, retrying after delay"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
        response = send().await?;
    }

    if attempt > 0 && !response.is_throttled() {
        debug!(operation = operation, attempt, "request succeeded after rate limiting");
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct FakeResponse {
        throttled: bool,
        retry_after: Option<u64>,
    }

    impl Throttled for FakeResponse {
        fn is_throttled(&self) -> bool {
            self.throttled
        }

        fn retry_after(&self) -> Option<Duration> {
            self.retry_after.map(Duration::from_secs)
        }
    }

    fn throttled(retry_after: Option<u64>) -> FakeResponse {
        FakeResponse {
            throttled: true,
            retry_after,
        }
    }

    const OK: FakeResponse = FakeResponse {
        throttled: false,
        retry_after: None,
    };

    #[test]
    fn delay_prefers_retry_after() {
        let policy = RateLimitPolicy::default();
        assert_eq!(policy.delay(0, None), Duration::from_secs(1));
        assert_eq!(policy.delay(3, None), Duration::from_secs(8));
        assert_eq!(policy.delay(3, Some(Duration::from_secs(2))), Duration::from_secs(2));
        assert_eq!(policy.delay(30, None), policy.max_delay);
    }

    #[test]
    fn parses_integer_retry_after_only() {
        assert_eq!(parse_retry_after(" 7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn retries_until_success() {
        let queue = Mutex::new(VecDeque::from(vec![throttled(Some(3)), throttled(None), OK]));
        let calls = Mutex::new(0u32);
        let policy = RateLimitPolicy::default();
        let started = tokio::time::Instant::now();

        let response: Result<FakeResponse, ()> = send_with_rate_limit(&policy, "test", || {
            *calls.lock() += 1;
            let next = queue.lock().pop_front().unwrap_or(OK);
            async move { Ok(next) }
        })
        .await;

        assert_eq!(response, Ok(OK));
        assert_eq!(*calls.lock(), 3);
        // 3s from Retry-After, then 2^1 seconds
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = Mutex::new(0u32);
        let policy = RateLimitPolicy::with_max_retries(2);

        let response: Result<FakeResponse, ()> = send_with_rate_limit(&policy, "test", || {
            *calls.lock() += 1;
            async { Ok(throttled(None)) }
        })
        .await;

        assert!(response.unwrap().is_throttled());
        assert_eq!(*calls.lock(), 3);
    }
}
