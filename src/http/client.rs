//! HTTP transport for the API endpoints.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::retry::{classify_response, RetryableError};
use crate::config::TransportConfig;

/// Header carrying the account's server token on every request.
pub const SERVER_TOKEN_HEADER: &str = "X-Postbox-Server-Token";

/// Raw HTTP operations against the API's base URL.
///
/// Implementations perform exactly one attempt per call; the retry policy
/// lives in [`crate::ApiClient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;
    async fn get_with_query(&self, path: &str, query: &[(String, String)]) -> Result<Value>;
    async fn post(&self, path: &str, body: String) -> Result<Value>;
    async fn put(&self, path: &str) -> Result<Value>;
}

/// Transport backed by a `reqwest::Client` with the server token and JSON
/// content negotiation installed as default headers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Builds a transport for the given server token and settings.
    pub fn new(server_token: &str, config: &TransportConfig) -> Result<Self> {
        if server_token.trim().is_empty() {
            bail!("Server token must not be empty");
        }
        config.validate()?;

        let token = HeaderValue::from_str(server_token)
            .context("Server token contains characters not valid in an HTTP header")?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(SERVER_TOKEN_HEADER, token);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends a prepared request and decodes the JSON response.
    /// Non-success statuses are classified for the retry layer.
    async fn dispatch(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::Error::from(RetryableError::Timeout(e.to_string()))
            } else {
                anyhow::Error::from(e).context("Failed to send request")
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            return Err(classify_response(status, &error_message(&body)));
        }

        serde_json::from_str(&body).context("Failed to parse JSON response")
    }
}

#[async_trait]
impl Transport for HttpClient {
    #[tracing::instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path);
        debug!("GET {}...", url);
        self.dispatch(self.client.get(&url)).await
    }

    #[tracing::instrument(skip(self, query))]
    async fn get_with_query(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self.endpoint(path);
        debug!("GET {} with query {:?}...", url, query);
        self.dispatch(self.client.get(&url).query(query)).await
    }

    #[tracing::instrument(skip(self, body))]
    async fn post(&self, path: &str, body: String) -> Result<Value> {
        let url = self.endpoint(path);
        debug!("POST {} ({} bytes)...", url, body.len());
        self.dispatch(self.client.post(&url).body(body)).await
    }

    #[tracing::instrument(skip(self))]
    async fn put(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path);
        debug!("PUT {}...", url);
        self.dispatch(self.client.put(&url)).await
    }
}

/// Extracts the service's error description from a response body, if present.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("Message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}
