//! Shared HTTP plumbing for the provider clients

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Build an HTTP client with the configured timeout
pub(crate) fn build_http(timeout_ms: u64) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(LlmError::Network)
}

/// POST a JSON body, retrying transient failures with exponential backoff
///
/// Returns the first successful response. A 429 on the final attempt is
/// surfaced as `RateLimited` with the server's `retry-after` hint.
pub(crate) async fn post_json(
    http: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<Response, LlmError> {
    let mut last_error = None;
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
            warn!(attempt, backoff_ms = backoff, %url, "post_json: retrying after transient error");
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }

        let mut request = http.post(url).header("content-type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(attempt, error = %e, "post_json: network error");
                last_error = Some(LlmError::Network(e));
                continue;
            }
        };

        let status = response.status().as_u16();
        if response.status().is_success() {
            debug!(status, "post_json: success");
            return Ok(response);
        }

        if status == 429 && attempt == MAX_RETRIES {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        let message = response.text().await.unwrap_or_default();
        if is_retryable_status(status) {
            debug!(attempt, status, "post_json: retryable error");
            last_error = Some(LlmError::ApiError { status, message });
            continue;
        }

        debug!(status, "post_json: API error");
        return Err(LlmError::ApiError { status, message });
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504, 529] {
            assert!(is_retryable_status(status), "{status} should be retryable");
        }
        for status in [200, 400, 401, 403, 404] {
            assert!(!is_retryable_status(status), "{status} should not be retryable");
        }
    }

    #[test]
    fn test_build_http() {
        assert!(build_http(1_000).is_ok());
    }
}
