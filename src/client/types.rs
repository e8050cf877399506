//! Request and response bodies for the seal lifecycle and secret endpoints.
//!
//! Lifecycle responses are typed but keep every field the service sent, so a
//! result serializes back to the body it was decoded from. Secret read/list
//! responses are kept as an opaque [`SecretEnvelope`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::secrets::{expose_on_wire, SecretString};

/// Response of `GET /sys/init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResult {
    pub initialized: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `PUT /sys/init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitArgs {
    /// Number of key shares to split the root key into
    pub secret_shares: u32,

    /// Number of shares required to reconstruct the root key
    pub secret_threshold: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgp_keys: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_token_pgp_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_shares: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_shares: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_threshold: Option<u32>,
}

impl InitArgs {
    pub fn new(secret_shares: u32, secret_threshold: u32) -> Self {
        Self {
            secret_shares,
            secret_threshold,
            pgp_keys: None,
            root_token_pgp_key: None,
            stored_shares: None,
            recovery_shares: None,
            recovery_threshold: None,
        }
    }
}

/// Response of `PUT /sys/init`.
///
/// Holds the generated key shares and the root token. Debug output is
/// redacted; the values are only reachable through
/// [`SecretString::expose_secret`].
#[derive(Debug, Clone, Deserialize)]
pub struct InitResult {
    pub keys: Vec<SecretString>,

    #[serde(default)]
    pub keys_base64: Vec<SecretString>,

    pub root_token: SecretString,
}

/// Body of `PUT /sys/unseal`: one key share, or a progress reset.
#[derive(Debug, Clone, Serialize)]
pub struct UnsealArgs {
    #[serde(serialize_with = "expose_on_wire", skip_serializing_if = "SecretString::is_empty")]
    pub key: SecretString,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
}

impl UnsealArgs {
    /// Submit a single key share.
    pub fn new(key: impl Into<SecretString>) -> Self {
        Self { key: key.into(), reset: None }
    }

    /// Discard the shares submitted so far.
    pub fn reset_progress() -> Self {
        Self { key: SecretString::default(), reset: Some(true) }
    }
}

/// Snapshot returned by `GET /sys/seal-status` and `PUT /sys/unseal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealStatus {
    pub sealed: bool,

    /// Shares required to unseal
    #[serde(rename = "t")]
    pub threshold: u32,

    /// Shares accepted so far toward the threshold
    pub progress: u32,

    /// Optional fields (`n`, `version`, ...) exactly as the service sent them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SealStatus {
    /// Total shares the root key was split into (`n`)
    pub fn shares(&self) -> Option<u32> {
        self.extra.get("n").and_then(Value::as_u64).and_then(|n| u32::try_from(n).ok())
    }

    pub fn version(&self) -> Option<&str> {
        self.extra.get("version").and_then(Value::as_str)
    }
}

/// Unsealing returns the updated seal status.
pub type UnsealResult = SealStatus;

/// Opaque response of secret reads and listings.
///
/// No schema is imposed; the accessors read the conventional envelope fields
/// when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretEnvelope(Map<String, Value>);

impl SecretEnvelope {
    /// The secret payload (`data`)
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data")
    }

    pub fn request_id(&self) -> Option<&str> {
        self.0.get("request_id").and_then(Value::as_str)
    }

    pub fn lease_id(&self) -> Option<&str> {
        self.0.get("lease_id").and_then(Value::as_str)
    }

    pub fn lease_duration(&self) -> Option<u64> {
        self.0.get("lease_duration").and_then(Value::as_u64)
    }

    pub fn renewable(&self) -> Option<bool> {
        self.0.get("renewable").and_then(Value::as_bool)
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.0
            .get("warnings")
            .and_then(Value::as_array)
            .map(|w| w.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Key names of a listing (`data.keys`)
    pub fn keys(&self) -> Vec<&str> {
        self.data()
            .and_then(|d| d.get("keys"))
            .and_then(Value::as_array)
            .map(|k| k.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Response of `GET /{path}`.
pub type ReadResult = SecretEnvelope;

/// Response of `GET /secret?list=true`.
pub type ListResult = SecretEnvelope;
