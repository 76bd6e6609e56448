//! Bounded retry with exponential backoff and jitter
//!
//! Makes transient server failures invisible to callers: 5xx responses are
//! retried with growing delays, everything else is returned as-is. On
//! exhaustion the LAST response is returned, never an error; callers inspect
//! the final status themselves.

use crate::transport::{Transport, TransportError};
use crate::types::{ApiRequest, ApiResponse};
use rand::Rng;
use std::time::Duration;

/// Default retry predicate: retry server-class failures only
#[inline]
#[must_use]
pub fn retry_on_server_error(status: u16) -> bool {
    status >= 500
}

/// Retry behavior knobs
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent retry
    pub base_delay: Duration,
    /// Decides, per response status, whether another attempt is warranted
    pub retry_on: fn(u16) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_on: retry_on_server_error,
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt bound
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Policy with a custom base delay
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Policy with a custom retry predicate
    #[inline]
    #[must_use]
    pub fn with_retry_on(mut self, retry_on: fn(u16) -> bool) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Delay before retry number `retry_index` (0-based): exponential plus
    /// uniform jitter up to 50% of the computed delay
    #[must_use]
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry_index));
        let jitter = exp.mul_f64(rand::rng().random_range(0.0..0.5));
        exp.saturating_add(jitter)
    }
}

/// Send a request, retrying responses the policy flags as transient
///
/// Transport-level failures (connection refused and the like) are not
/// retried; they propagate immediately. Responses that the predicate
/// declines to retry are returned on the spot, so 4xx fails fast.
pub async fn send_with_retry(
    transport: &dyn Transport,
    req: &ApiRequest,
    policy: &RetryPolicy,
) -> Result<ApiResponse, TransportError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let resp = transport.send(req).await?;

        if !(policy.retry_on)(resp.status) {
            return Ok(resp);
        }

        attempt += 1;
        if attempt >= max_attempts {
            tracing::debug!(
                "{} {}: status {} after {} attempts, giving up",
                req.method,
                req.url,
                resp.status,
                attempt
            );
            return Ok(resp);
        }

        let delay = policy.delay_for(attempt - 1);
        tracing::debug!(
            "{} {}: status {}, retrying in {:?} (attempt {}/{})",
            req.method,
            req.url,
            resp.status,
            delay,
            attempt + 1,
            max_attempts
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Plays back a fixed sequence of statuses, counting sends
    struct SequenceTransport {
        statuses: Mutex<Vec<u16>>,
        sends: AtomicUsize,
    }

    impl SequenceTransport {
        fn new(statuses: &[u16]) -> Self {
            let mut s: Vec<u16> = statuses.to_vec();
            s.reverse();
            Self {
                statuses: Mutex::new(s),
                sends: AtomicUsize::new(0),
            }
        }

        fn send_count(&self) -> usize {
            self.sends.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for SequenceTransport {
        async fn send(&self, _req: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| TransportError::Unavailable("script exhausted".to_string()))?;
            Ok(ApiResponse::new(status, "{}"))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn recovers_after_two_server_errors() {
        let transport = SequenceTransport::new(&[500, 500, 200]);
        let req = ApiRequest::get("http://api.test/x");

        let resp = send_with_retry(&transport, &req, &fast_policy())
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.send_count(), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_response_without_extra_attempt() {
        let transport = SequenceTransport::new(&[500, 500, 500, 500]);
        let req = ApiRequest::get("http://api.test/x");

        let resp = send_with_retry(&transport, &req, &fast_policy())
            .await
            .unwrap();

        // Third response is the last allowed attempt; the fourth scripted
        // response must never be consumed.
        assert_eq!(resp.status, 500);
        assert_eq!(transport.send_count(), 3);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let transport = SequenceTransport::new(&[404, 200]);
        let req = ApiRequest::get("http://api.test/x");

        let resp = send_with_retry(&transport, &req, &fast_policy())
            .await
            .unwrap();

        assert_eq!(resp.status, 404);
        assert_eq!(transport.send_count(), 1);
    }

    #[tokio::test]
    async fn success_returns_immediately() {
        let transport = SequenceTransport::new(&[201]);
        let req = ApiRequest::post("http://api.test/x");

        let resp = send_with_retry(&transport, &req, &fast_policy())
            .await
            .unwrap();

        assert_eq!(resp.status, 201);
        assert_eq!(transport.send_count(), 1);
    }

    #[tokio::test]
    async fn custom_predicate_controls_retry() {
        fn retry_on_teapot(status: u16) -> bool {
            status == 418
        }
        let transport = SequenceTransport::new(&[418, 200]);
        let req = ApiRequest::get("http://api.test/x");
        let policy = fast_policy().with_retry_on(retry_on_teapot);

        let resp = send_with_retry(&transport, &req, &policy).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.send_count(), 2);
    }

    #[tokio::test]
    async fn transport_failure_propagates_without_retry() {
        let transport = SequenceTransport::new(&[]);
        let req = ApiRequest::get("http://api.test/x");

        let err = send_with_retry(&transport, &req, &fast_policy()).await;
        assert!(matches!(err, Err(TransportError::Unavailable(_))));
        assert_eq!(transport.send_count(), 1);
    }

    #[test]
    fn delay_grows_exponentially_with_bounded_jitter() {
        let policy = RetryPolicy::default().with_base_delay(Duration::from_millis(100));

        for retry_index in 0..3 {
            let exp = Duration::from_millis(100 * 2u64.pow(retry_index));
            let d = policy.delay_for(retry_index);
            assert!(d >= exp, "delay below exponential floor");
            assert!(d < exp.mul_f64(1.5), "jitter exceeded 50% of delay");
        }
    }

    #[test]
    fn max_attempts_floor_is_one() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert_eq!(policy.max_attempts, 1);
    }
}
