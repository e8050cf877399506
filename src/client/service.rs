//! The Vault client: seal lifecycle and token-scoped secret operations.
//!
//! Every operation is one request/response exchange built by
//! [`build_request`], executed by a [`Transport`], and classified by status.
//! The client keeps no state besides the fixed base URL, so one instance can
//! serve any number of concurrent calls. It enforces no ordering between
//! calls (init before unseal, unseal before reads); the service does.

use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn, Instrument};

use super::request::{build_request, RequestOptions};
use super::transport::{HttpResponse, ReqwestTransport, Transport};
use super::types::{
    InitArgs, InitResult, ListResult, ReadResult, SealStatus, StatusResult, UnsealArgs,
    UnsealResult,
};
use crate::config::{ClientSettings, ServiceConfig};
use crate::errors::{Result, VaultError};
use crate::vault_span;

/// Which statuses count as success for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Data-returning calls: 200 only
    Body,
    /// Confirmatory calls that may answer without a body: 200 or 204
    Confirm,
}

impl Expect {
    pub fn accepts(self, status: u16) -> bool {
        match self {
            Expect::Body => status == 200,
            Expect::Confirm => status == 200 || status == 204,
        }
    }
}

/// Message for a failed response: the first reported error, else `Status {code}`.
pub fn error_message(status: u16, body: Option<&Value>) -> String {
    body.and_then(|b| b.get("errors"))
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .map(|first| match first {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| format!("Status {}", status))
}

/// Turn a response into its body or a protocol error.
pub fn classify(response: HttpResponse, expect: Expect) -> Result<Option<Value>> {
    if expect.accepts(response.status) {
        Ok(response.body)
    } else {
        let message = error_message(response.status, response.body.as_ref());
        Err(VaultError::protocol(response.status, message))
    }
}

/// Client for a Vault-compatible secret service.
#[derive(Clone)]
pub struct VaultService {
    config: ServiceConfig,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for VaultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService").field("base_url", &self.base_url).finish()
    }
}

impl VaultService {
    /// Client using the default reqwest transport with a 30 second timeout.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let settings = ClientSettings { vault: config, ..Default::default() };
        Self::from_settings(&settings)
    }

    /// Client configured from loaded settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let transport = ReqwestTransport::new(settings.timeout())?;
        Self::with_transport(settings.vault.clone(), Arc::new(transport))
    }

    /// Client over a caller-provided transport.
    pub fn with_transport(config: ServiceConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate_config()?;
        let base_url = config.base_url();
        debug!(base_url = %base_url, "Vault client configured");

        Ok(Self { config, base_url, transport })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// `destination/api_version`, fixed at construction
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` under the base URL. Dot segments are rejected since URL
    /// parsing would resolve them outside `destination/api_version`.
    fn endpoint(&self, path: &str) -> Result<String> {
        let relative = path.trim_start_matches('/');
        let route = relative.split(['?', '#']).next().unwrap_or_default();
        if route.split('/').any(is_dot_segment) {
            return Err(VaultError::invalid_request(format!(
                "path '{}' must not contain '.' or '..' segments",
                path
            )));
        }
        Ok(format!("{}/{}", self.base_url, relative))
    }

    /// Initialization state of the service (`GET /sys/init`).
    pub async fn status(&self, options: &RequestOptions) -> Result<StatusResult> {
        let body =
            self.fetch("status", Method::GET, "sys/init", None, "", options, Expect::Body).await?;
        decode("status", body)
    }

    /// Initialize the service with a key-splitting scheme (`PUT /sys/init`).
    ///
    /// The returned key shares and root token are the only copy the caller
    /// gets; they are never logged.
    pub async fn init(&self, args: &InitArgs, options: &RequestOptions) -> Result<InitResult> {
        let body = to_body(args)?;
        let body = self
            .fetch("init", Method::PUT, "sys/init", Some(body), "", options, Expect::Body)
            .await?;
        decode("init", body)
    }

    /// Seal state and unseal progress (`GET /sys/seal-status`).
    pub async fn seal_status(&self, options: &RequestOptions) -> Result<SealStatus> {
        let body = self
            .fetch("seal_status", Method::GET, "sys/seal-status", None, "", options, Expect::Body)
            .await?;
        decode("seal_status", body)
    }

    /// Seal the service (`PUT /sys/seal`). Any response body is discarded.
    pub async fn seal(&self, token: &str, options: &RequestOptions) -> Result<()> {
        self.fetch("seal", Method::PUT, "sys/seal", None, token, options, Expect::Confirm).await?;
        Ok(())
    }

    /// Submit one key share (`PUT /sys/unseal`).
    ///
    /// Progress is tracked by the service. Call once per share until the
    /// returned status reports `sealed == false`.
    pub async fn unseal(
        &self,
        args: &UnsealArgs,
        options: &RequestOptions,
    ) -> Result<UnsealResult> {
        let body = to_body(args)?;
        let body = self
            .fetch("unseal", Method::PUT, "sys/unseal", Some(body), "", options, Expect::Confirm)
            .await?;
        decode("unseal", body)
    }

    /// Read the secret at `path` (`GET /{path}`).
    pub async fn read(
        &self,
        path: &str,
        token: &str,
        options: &RequestOptions,
    ) -> Result<ReadResult> {
        let body = self.fetch("read", Method::GET, path, None, token, options, Expect::Body).await?;
        decode("read", body)
    }

    /// List the keys under the `secret` mount (`GET /secret?list=true`).
    pub async fn list(&self, token: &str, options: &RequestOptions) -> Result<ListResult> {
        let body = self
            .fetch("list", Method::GET, "secret?list=true", None, token, options, Expect::Body)
            .await?;
        decode("list", body)
    }

    /// Write `value` as JSON to `path` (`POST /{path}`).
    ///
    /// Any response body is discarded.
    pub async fn write<T>(
        &self,
        path: &str,
        value: &T,
        token: &str,
        options: &RequestOptions,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let body = to_body(value)?;
        self.fetch("write", Method::POST, path, Some(body), token, options, Expect::Confirm).await?;
        Ok(())
    }

    /// Build, execute and classify one request.
    #[allow(clippy::too_many_arguments)]
    async fn fetch(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: &str,
        options: &RequestOptions,
        expect: Expect,
    ) -> Result<Option<Value>> {
        let request = build_request(options, method, &self.endpoint(path)?, body, token)?;
        let span = vault_span!(operation, request.method);

        async move {
            debug!(uri = %request.url, "Dispatching request");

            let response = match self.transport.execute(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "Request did not complete");
                    return Err(e);
                }
            };

            debug!(status = response.status, "Received response");
            let status = response.status;
            classify(response, expect).inspect_err(|e| {
                warn!(status, error = %e, "Service rejected request");
            })
        }
        .instrument(span)
        .await
    }
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

fn to_body<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| VaultError::invalid_request(format!("body is not JSON-serializable: {}", e)))
}

fn decode<T: DeserializeOwned>(operation: &str, body: Option<Value>) -> Result<T> {
    let body = body.ok_or_else(|| VaultError::empty_response(operation))?;
    serde_json::from_value(body)
        .map_err(|e| VaultError::decode(e, format!("unexpected {} response", operation)))
}
