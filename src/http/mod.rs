//! HTTP transport module with retry-aware error classification.

mod client;
mod retry;

pub use client::{HttpClient, Transport, SERVER_TOKEN_HEADER};
pub use retry::{classify_response, with_retry, NonRetryableError, RetryableError, RETRY_DELAY_MS};

#[cfg(test)]
pub use client::MockTransport;
