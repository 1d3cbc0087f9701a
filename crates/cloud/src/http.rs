//! Shared HTTP plumbing: client construction, bounded retry with
//! exponential backoff, and response status handling.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::CloudApiError;

/// Default timeout for a single outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the HTTP client shared by all cloud clients.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, CloudApiError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("interpret/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self::with_max_retries(0)
    }

    /// Next backoff delay, clamped to [`RetryPolicy::max_delay`].
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_delay)
    }
}

/// Rate limiting and server-side failures are worth another attempt.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send the request produced by `build`, retrying network failures and
/// transient statuses with backoff.
///
/// The final response is returned whatever its status; callers decide what
/// counts as success.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    operation: &'static str,
    build: F,
) -> Result<reqwest::Response, CloudApiError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let outcome = build().send().await;

        let retryable = match &outcome {
            Ok(response) => is_transient_status(response.status()),
            Err(e) => !e.is_builder(),
        };

        if !retryable || attempt > policy.max_retries {
            if attempt > 1 {
                tracing::debug!(operation, attempts = attempt, "Finished retrying upstream call");
            }
            return outcome.map_err(CloudApiError::from);
        }

        match &outcome {
            Ok(response) => tracing::warn!(
                operation,
                attempt,
                status = response.status().as_u16(),
                delay_ms = delay.as_millis() as u64,
                "Upstream call returned a transient status, retrying"
            ),
            Err(e) => tracing::warn!(
                operation,
                attempt,
                error = %e,
                delay_ms = delay.as_millis() as u64,
                "Upstream call failed, retrying"
            ),
        }

        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Return the response unchanged on a success status, or a
/// [`CloudApiError::ApiError`] with the status and body text.
pub async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, CloudApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(CloudApiError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CloudApiError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| CloudApiError::Decode(e.to_string()))
}
