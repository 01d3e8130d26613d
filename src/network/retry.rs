//! Exponential back-off for transient upstream failures

use super::{HttpResponse, TransportError};
use crate::cancellation::CancellationToken;
use crate::config::RetrySettings;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy wrapped around a single transport call.
///
/// Transient outcomes (5xx, 408, 429 and transport failures) are retried up
/// to `max_retries` times, waiting `base_delay * 2^attempt` between attempts.
/// Callers only ever see the outcome of the last attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_retries, settings.base_delay())
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Whether an attempt's outcome should be retried
    pub fn is_transient(result: &Result<HttpResponse, TransportError>) -> bool {
        match result {
            Ok(response) => {
                response.status >= 500 || response.status == 408 || response.status == 429
            }
            Err(TransportError::Request(_)) => true,
            Err(TransportError::Cancelled) => false,
        }
    }

    /// Run `op` until it yields a non-transient outcome or retries run out
    pub async fn execute<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<HttpResponse, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, TransportError>>,
    {
        let mut attempt = 0;
        loop {
            let result = op().await;
            if attempt >= self.max_retries || !Self::is_transient(&result) {
                return result;
            }

            attempt += 1;
            let delay = self.delay_for(attempt);
            match &result {
                Ok(response) => warn!(
                    status = response.status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient upstream response, retrying"
                ),
                Err(e) => warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Upstream request failed, retrying"
                ),
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{HttpClient, HttpRequest};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Default::default(),
            body: Vec::new(),
            url: String::new(),
        }
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_transient_classification() {
        assert!(RetryPolicy::is_transient(&Ok(response(503))));
        assert!(RetryPolicy::is_transient(&Ok(response(500))));
        assert!(RetryPolicy::is_transient(&Ok(response(429))));
        assert!(RetryPolicy::is_transient(&Ok(response(408))));
        assert!(!RetryPolicy::is_transient(&Ok(response(200))));
        assert!(!RetryPolicy::is_transient(&Ok(response(401))));
        assert!(!RetryPolicy::is_transient(&Err(TransportError::Cancelled)));
    }

    #[tokio::test]
    async fn test_stops_after_max_retries() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(&CancellationToken::new(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(response(503))
                }
            })
            .await;

        assert_eq!(result.unwrap().status, 503);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(&CancellationToken::new(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(response(401))
                }
            })
            .await;

        assert_eq!(result.unwrap().status, 401);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = HttpRequest::get(server.uri());
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result = policy
            .execute(&cancel, || client.execute(&request, &cancel))
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.text(), "ok");
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            policy.execute(&cancel, || async { Ok(response(503)) }),
        )
        .await
        .expect("back-off should be interrupted");

        assert!(matches!(result, Err(TransportError::Cancelled)));
    }
}
