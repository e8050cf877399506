//! HTTP transport behind the Vault client.
//!
//! The client only needs one exchange: send a validated [`HttpRequest`], get a
//! status code and an optional parsed body back. [`ReqwestTransport`] is the
//! production implementation; tests can plug in their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

use super::request::HttpRequest;
use crate::errors::{Result, VaultError};

/// Status and parsed body of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }
}

/// One request/response exchange.
///
/// Implementations return `Err` when the exchange could not complete and
/// `Ok` for any response the server produced, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests default to `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            VaultError::config_with_source("Failed to build HTTP client", Box::new(e))
        })?;

        Ok(Self { client })
    }

    /// Wrap an existing client (custom TLS roots, proxies, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, request.url).headers(request.headers);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(HttpResponse { status, body: parse_body(text) })
    }
}

/// Empty bodies become `None`; anything that is not JSON is kept as a string.
fn parse_body(text: String) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(_) => {
            trace!(length = text.len(), "Response body is not JSON; keeping raw text");
            Some(Value::String(text))
        }
    }
}
