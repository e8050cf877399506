//! Per-call request options and request assembly.
//!
//! Every operation computes a base request (method, URI, optional JSON body,
//! token header) and deep-merges it with the caller's [`RequestOptions`]. The
//! computed `uri`, `method` and `json` keys win over the caller's, the token
//! header wins over a caller-supplied one, and any other caller key (extra
//! headers, a timeout, fields the transport ignores) is kept.

use std::collections::BTreeMap;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use url::Url;

use crate::errors::{Result, VaultError};
use crate::observability::TraceHeaders;
use crate::utils::{deep_merge, merge_into};

/// Header carrying the bearer token on every call.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Caller-overridable part of a request.
///
/// Serializes as one object: a `headers` object or `timeout_ms` placed in
/// `extra` is combined with the typed fields, which win per key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestOptions {
    /// Extra headers, combined with the computed ones
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout handed to the transport unmodified
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Any other field; carried through the merge untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Attach the output of the trace context adapter.
    pub fn with_trace_headers(mut self, trace_headers: &TraceHeaders) -> Self {
        for (name, value) in trace_headers.iter() {
            self.headers.insert(name.as_str().to_string(), value.to_string());
        }
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The caller's side of the merge.
    fn to_merge_value(&self) -> Value {
        let mut typed = Map::new();
        if !self.headers.is_empty() {
            typed.insert("headers".to_string(), json!(self.headers));
        }
        if let Some(timeout_ms) = self.timeout_ms {
            typed.insert("timeout_ms".to_string(), json!(timeout_ms));
        }

        let mut caller = Value::Object(self.extra.clone());
        merge_into(&mut caller, &Value::Object(typed));
        caller
    }
}

impl Serialize for RequestOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_merge_value().serialize(serializer)
    }
}

/// The merged request description before validation.
#[derive(Debug, Deserialize)]
struct MergedRequest {
    method: String,
    uri: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    json: Option<Value>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

/// A validated request ready for the transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Value of a header as a string, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TryFrom<MergedRequest> for HttpRequest {
    type Error = VaultError;

    fn try_from(merged: MergedRequest) -> Result<Self> {
        let method = Method::from_bytes(merged.method.as_bytes()).map_err(|_| {
            VaultError::invalid_request(format!("invalid HTTP method '{}'", merged.method))
        })?;

        let url = Url::parse(&merged.uri).map_err(|e| {
            VaultError::invalid_request(format!("invalid URI '{}': {}", merged.uri, e))
        })?;

        let mut headers = HeaderMap::with_capacity(merged.headers.len());
        for (name, value) in &merged.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                VaultError::invalid_request(format!("invalid header name '{}'", name))
            })?;
            // Never echo the value; it may be the token.
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                VaultError::invalid_request(format!("invalid value for header '{}'", name))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(Self {
            method,
            url,
            headers,
            body: merged.json,
            timeout: merged.timeout_ms.map(Duration::from_millis),
        })
    }
}

/// Merge caller options with the computed request for one call.
pub fn build_request(
    options: &RequestOptions,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: &str,
) -> Result<HttpRequest> {
    let caller = options.to_merge_value();

    let mut computed = json!({ "uri": uri, "method": method.as_str() });
    if let Some(body) = body {
        computed["json"] = body;
    }

    let mut merged = deep_merge(&caller, &computed);
    merge_into(&mut merged, &json!({ "headers": { TOKEN_HEADER: token } }));

    let resolved: MergedRequest = serde_json::from_value(merged)
        .map_err(|e| VaultError::invalid_request(format!("malformed request options: {}", e)))?;
    let mut request = HttpRequest::try_from(resolved)?;

    // Header names are case-insensitive; a caller's "x-vault-token" must not shadow the token.
    let token_value = HeaderValue::from_str(token).map_err(|_| {
        VaultError::invalid_request(format!("invalid value for header '{}'", TOKEN_HEADER))
    })?;
    request.headers.insert(HeaderName::from_static("x-vault-token"), token_value);
    Ok(request)
}
