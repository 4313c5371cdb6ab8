//! The retrying API client exposing the service's operations.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::Config;
use crate::http::{with_retry, HttpClient, Transport};
use crate::message::MessagePayload;

/// Client for the API, generic over its transport.
///
/// Message-sending operations run under the bounded retry policy; lookups
/// are issued once. Responses are returned as decoded JSON, verbatim.
pub struct ApiClient<T: Transport = HttpClient> {
    transport: T,
    max_retries: usize,
}

impl ApiClient {
    /// Builds a client over an [`HttpClient`] transport.
    pub fn new(server_token: &str, config: &Config) -> Result<Self> {
        let transport = HttpClient::new(server_token, &config.transport)?;
        Ok(Self {
            transport,
            max_retries: config.max_retries,
        })
    }
}

impl<T: Transport> ApiClient<T> {
    /// Builds a client over an already-constructed transport.
    pub fn with_transport(transport: T, max_retries: usize) -> Self {
        Self {
            transport,
            max_retries,
        }
    }

    /// Returns a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Total attempts made for a message-sending operation.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Serializes the message's map form and POSTs it to `email`.
    #[tracing::instrument(skip(self, message))]
    pub async fn deliver_message<M: MessagePayload>(&self, message: &M) -> Result<Value> {
        let body =
            serde_json::to_string(&message.to_message_map()).context("Failed to serialize message")?;

        with_retry("Delivering message", self.max_retries, || {
            let body = body.clone();
            async move { self.transport.post("email", body).await }
        })
        .await
    }

    /// Serializes the messages' map forms as a JSON array and POSTs it to
    /// `email/batch`.
    #[tracing::instrument(skip(self, messages))]
    pub async fn deliver_messages<M: MessagePayload>(&self, messages: &[M]) -> Result<Value> {
        let maps: Vec<_> = messages.iter().map(|m| m.to_message_map()).collect();
        let body =
            serde_json::to_string(&maps).context("Failed to serialize message batch")?;

        with_retry("Delivering message batch", self.max_retries, || {
            let body = body.clone();
            async move { self.transport.post("email/batch", body).await }
        })
        .await
    }

    /// Fetches aggregate delivery statistics.
    #[tracing::instrument(skip(self))]
    pub async fn delivery_stats(&self) -> Result<Value> {
        self.transport.get("deliverystats").await
    }

    /// Lists bounces, filtered by the given query options.
    #[tracing::instrument(skip(self, options))]
    pub async fn get_bounces(&self, options: &[(&str, &str)]) -> Result<Value> {
        let query: Vec<(String, String)> = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.transport.get_with_query("bounces", &query).await
    }

    /// Lists the tags that have bounced messages.
    #[tracing::instrument(skip(self))]
    pub async fn get_bounced_tags(&self) -> Result<Value> {
        self.transport.get("bounces/tags").await
    }

    /// Fetches a single bounce record by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_bounce(&self, id: u64) -> Result<Value> {
        self.transport.get(&format!("bounces/{}", id)).await
    }

    /// Fetches the raw message dump for a bounce.
    #[tracing::instrument(skip(self))]
    pub async fn dump_bounce(&self, id: u64) -> Result<Value> {
        self.transport.get(&format!("bounces/{}/dump", id)).await
    }

    /// Reactivates a bounced address so the service delivers to it again.
    #[tracing::instrument(skip(self))]
    pub async fn activate_bounce(&self, id: u64) -> Result<Value> {
        self.transport.put(&format!("bounces/{}/activate", id)).await
    }
}
