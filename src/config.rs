//! Client and transport configuration.

use anyhow::{bail, Result};
use std::time::Duration;

/// Default number of total delivery attempts for message sends.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.postboxapp.com";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for [`crate::ApiClient`].
///
/// `max_retries` bounds the total attempts made for message-sending
/// operations; everything else is forwarded to the transport.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_retries: usize,
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            transport: TransportConfig::default(),
        }
    }
}

/// Configuration consumed by [`crate::HttpClient`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL the endpoint paths are resolved against.
    pub base_url: String,
    /// Per-request timeout, covering connect through response body.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TransportConfig {
    /// Validates the transport settings before a client is built from them.
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!("Invalid base URL '{}': expected an http(s) URL", self.base_url);
        }
        if self.timeout.is_zero() {
            bail!("Transport timeout must be greater than zero");
        }
        Ok(())
    }
}
