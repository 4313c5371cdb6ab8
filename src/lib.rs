//! Client library for the Postbox transactional email HTTP API.
//!
//! [`ApiClient`] exposes the service's operations (message delivery, delivery
//! statistics, bounce queries) over an HTTP transport, retrying transient
//! failures up to a configured bound.

pub mod client;
pub mod config;
pub mod http;
pub mod message;

pub use client::ApiClient;
pub use config::{Config, TransportConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};
pub use http::{HttpClient, NonRetryableError, RetryableError, Transport};
pub use message::{message_map_from, MessagePayload};
