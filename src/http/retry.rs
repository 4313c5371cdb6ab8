//! Retry logic for API calls with error classification.

use anyhow::{anyhow, Result};
use log::{debug, warn};
use reqwest::StatusCode;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Transient failures that are safe to re-attempt.
#[derive(Debug)]
pub enum RetryableError {
    /// The service failed on its side (HTTP 5xx).
    ServerError { status: u16, message: String },
    /// The request timed out before a response arrived.
    Timeout(String),
}

impl std::fmt::Display for RetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryableError::ServerError { status, message } => {
                if message.is_empty() {
                    write!(f, "Server error: HTTP {}", status)
                } else {
                    write!(f, "Server error: HTTP {}: {}", status, message)
                }
            }
            RetryableError::Timeout(msg) => {
                write!(f, "Request timed out: {}", msg)
            }
        }
    }
}

impl std::error::Error for RetryableError {}

/// Errors that should not be retried.
#[derive(Debug)]
pub enum NonRetryableError {
    /// Missing or invalid server token (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// The request was understood but its content was rejected (HTTP 422)
    UnprocessableEntity(String),
    /// Rate limit exceeded (HTTP 429)
    RateLimitExceeded(String),
    /// Other client errors that won't succeed on retry
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check your server token.", msg)
            }
            NonRetryableError::NotFound(msg) => {
                write!(f, "Not found: {}", msg)
            }
            NonRetryableError::UnprocessableEntity(msg) => {
                write!(f, "Unprocessable request: {}", msg)
            }
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(f, "Rate limit exceeded: {}. Try again later.", msg)
            }
            NonRetryableError::ClientError(msg) => {
                write!(f, "Request error: {}", msg)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies a non-success response into a retryable or non-retryable error.
///
/// `message` is the service's own description from the error body, when it
/// provided one. Every 5xx is retryable; every 4xx is not.
pub fn classify_response(status: StatusCode, message: &str) -> anyhow::Error {
    if status.is_server_error() {
        return anyhow::Error::from(RetryableError::ServerError {
            status: status.as_u16(),
            message: message.to_string(),
        });
    }

    let non_retryable = match status {
        StatusCode::UNAUTHORIZED => NonRetryableError::AuthenticationFailed(or_default(
            message,
            "Invalid or missing server token",
        )),
        StatusCode::NOT_FOUND => {
            NonRetryableError::NotFound(or_default(message, "The requested resource was not found"))
        }
        StatusCode::UNPROCESSABLE_ENTITY => NonRetryableError::UnprocessableEntity(or_default(
            message,
            "The request contained invalid fields",
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            NonRetryableError::RateLimitExceeded(or_default(message, "Too many requests"))
        }
        s => NonRetryableError::ClientError(if message.is_empty() {
            format!("HTTP {} error", s.as_u16())
        } else {
            format!("HTTP {} error: {}", s.as_u16(), message)
        }),
    };

    anyhow::Error::from(non_retryable)
}

fn or_default(message: &str, default: &str) -> String {
    if message.is_empty() {
        default.to_string()
    } else {
        message.to_string()
    }
}

/// Checks if an anyhow::Error is retryable based on its classification.
fn is_retryable_error(e: &anyhow::Error) -> bool {
    if e.downcast_ref::<NonRetryableError>().is_some() {
        return false;
    }
    if e.downcast_ref::<RetryableError>().is_some() {
        return true;
    }
    // Raw transport errors: only timeouts qualify.
    if let Some(e) = e.downcast_ref::<reqwest::Error>() {
        return e.is_timeout();
    }

    false
}

/// Executes an async operation with retry logic.
///
/// Re-attempts on server errors (5xx) and timeouts, up to `max_retries` total
/// attempts. Returns on the first success; any other failure propagates
/// immediately, and once attempts are exhausted the last error is returned
/// unchanged.
pub async fn with_retry<F, Fut, T>(operation_name: &str, max_retries: usize, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable_error(&e) {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }

                if attempt < max_retries {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                        operation_name, attempt, max_retries, e, RETRY_DELAY_MS
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("{}: failed after {} attempts", operation_name, max_retries)))
}
