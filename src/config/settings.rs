//! # Configuration Settings
//!
//! Defines the configuration structure for the Vault client.

use crate::errors::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Top-level client settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientSettings {
    /// Service destination and API version
    #[validate(nested)]
    #[serde(default)]
    pub vault: ServiceConfig,

    /// Default per-request timeout applied by the HTTP transport
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Logging and tracer settings
    #[validate(nested)]
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            vault: ServiceConfig::default(),
            timeout_seconds: default_timeout_seconds(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ClientSettings {
    /// Read settings from the conventional environment variables.
    pub fn from_env() -> Result<Self> {
        let timeout_seconds = match std::env::var("VAULT_CLIENT_TIMEOUT_SECONDS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                VaultError::config(format!("Invalid VAULT_CLIENT_TIMEOUT_SECONDS: {}", e))
            })?,
            Err(_) => default_timeout_seconds(),
        };

        let settings = Self {
            vault: ServiceConfig::from_env(),
            timeout_seconds,
            observability: ObservabilityConfig::from_env()?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Layer a settings file and `VAULT_CLIENT__*` environment overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `VAULT_CLIENT__VAULT__DESTINATION=https://vault:8200`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("VAULT_CLIENT").prefix_separator("__").separator("__"),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(VaultError::from)?;
        self.vault.validate_destination()?;
        Ok(())
    }

    /// Default request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Where the service lives and which API version to address.
///
/// Fixed for the lifetime of a client; the client derives its request base
/// from it once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ServiceConfig {
    /// Scheme, host and port of the service, e.g. `http://127.0.0.1:8200`
    #[validate(length(min = 1, message = "Destination cannot be empty"))]
    pub destination: String,

    /// API version path segment, e.g. `v1`
    #[validate(length(min = 1, message = "API version cannot be empty"))]
    pub api_version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { destination: "http://127.0.0.1:8200".to_string(), api_version: "v1".to_string() }
    }
}

impl ServiceConfig {
    pub fn new(destination: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self { destination: destination.into(), api_version: api_version.into() }
    }

    /// Read `VAULT_ADDR` and `VAULT_API_VERSION`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            destination: std::env::var("VAULT_ADDR").unwrap_or(defaults.destination),
            api_version: std::env::var("VAULT_API_VERSION").unwrap_or(defaults.api_version),
        }
    }

    /// `destination/api_version` with exactly one slash at the join.
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.destination.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// Validate field rules plus URL shape of the destination
    pub fn validate_config(&self) -> Result<()> {
        Validate::validate(self).map_err(VaultError::from)?;
        self.validate_destination()
    }

    fn validate_destination(&self) -> Result<()> {
        let url = url::Url::parse(&self.destination).map_err(|e| {
            VaultError::validation_field(
                format!("Destination '{}' is not a valid URL: {}", self.destination, e),
                "destination",
            )
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(VaultError::validation_field(
                format!("Destination scheme must be http or https, got '{}'", url.scheme()),
                "destination",
            ));
        }

        if self.api_version.trim_matches('/').is_empty() {
            return Err(VaultError::validation_field(
                "API version cannot be only slashes",
                "api_version",
            ));
        }

        Ok(())
    }
}

/// Logging and tracer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name reported by the tracer
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Span collector endpoint; console reporting when unset
    pub trace_endpoint: Option<String>,

    /// Fraction of traces sampled when not in debug mode
    #[validate(range(min = 0.0, max = 1.0, message = "Sample rate must be between 0.0 and 1.0"))]
    pub trace_sample_rate: f64,

    /// Sample every trace
    pub trace_debug: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "vault-client".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            trace_endpoint: None,
            trace_sample_rate: 0.1,
            trace_debug: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let trace_sample_rate = match std::env::var("VAULT_CLIENT_TRACE_SAMPLE_RATE") {
            Ok(raw) => raw.parse::<f64>().map_err(|e| {
                VaultError::config(format!("Invalid VAULT_CLIENT_TRACE_SAMPLE_RATE: {}", e))
            })?,
            Err(_) => defaults.trace_sample_rate,
        };

        Ok(Self {
            service_name: std::env::var("VAULT_CLIENT_SERVICE_NAME")
                .unwrap_or(defaults.service_name),
            log_level: std::env::var("VAULT_CLIENT_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: env_flag("VAULT_CLIENT_JSON_LOGGING"),
            trace_endpoint: std::env::var("VAULT_CLIENT_TRACE_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            trace_sample_rate,
            trace_debug: env_flag("VAULT_CLIENT_TRACE_DEBUG"),
        })
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|s| s.to_lowercase() == "true" || s == "1").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize tests that touch process environment
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "VAULT_ADDR",
        "VAULT_API_VERSION",
        "VAULT_CLIENT_TIMEOUT_SECONDS",
        "VAULT_CLIENT_SERVICE_NAME",
        "VAULT_CLIENT_LOG_LEVEL",
        "VAULT_CLIENT_JSON_LOGGING",
        "VAULT_CLIENT_TRACE_ENDPOINT",
        "VAULT_CLIENT_TRACE_SAMPLE_RATE",
        "VAULT_CLIENT_TRACE_DEBUG",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_base_url_joins_with_single_slash() {
        let cases = [
            ("http://vault:8200", "v1"),
            ("http://vault:8200/", "v1"),
            ("http://vault:8200", "/v1"),
            ("http://vault:8200/", "/v1/"),
            ("http://vault:8200//", "v1/"),
        ];

        for (destination, version) in cases {
            let config = ServiceConfig::new(destination, version);
            assert_eq!(config.base_url(), "http://vault:8200/v1", "{destination} + {version}");
        }
    }

    #[test]
    fn test_base_url_keeps_destination_path_prefix() {
        let config = ServiceConfig::new("https://proxy.local/vault/", "v1");
        assert_eq!(config.base_url(), "https://proxy.local/vault/v1");
    }

    #[test]
    fn test_service_config_validation() {
        assert!(ServiceConfig::default().validate_config().is_ok());
        assert!(ServiceConfig::new("not a url", "v1").validate_config().is_err());
        assert!(ServiceConfig::new("ftp://vault", "v1").validate_config().is_err());
        assert!(ServiceConfig::new("http://vault", "").validate_config().is_err());
        assert!(ServiceConfig::new("http://vault", "//").validate_config().is_err());
    }

    #[test]
    fn test_sample_rate_out_of_range_rejected() {
        let settings = ClientSettings {
            observability: ObservabilityConfig {
                trace_sample_rate: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Sample rate"));
    }

    #[test]
    fn test_default_settings_validate() {
        let settings = ClientSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let settings = ClientSettings::from_env().unwrap();
        assert_eq!(settings.vault, ServiceConfig::default());
        assert_eq!(settings.timeout_seconds, 30);
        assert_eq!(settings.observability.service_name, "vault-client");
        assert!(settings.observability.trace_endpoint.is_none());
        assert!(!settings.observability.trace_debug);
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("VAULT_ADDR", "https://vault.internal:8200");
        std::env::set_var("VAULT_API_VERSION", "v2");
        std::env::set_var("VAULT_CLIENT_TIMEOUT_SECONDS", "5");
        std::env::set_var("VAULT_CLIENT_TRACE_ENDPOINT", "http://collector:4318/v1/traces");
        std::env::set_var("VAULT_CLIENT_TRACE_SAMPLE_RATE", "0.5");
        std::env::set_var("VAULT_CLIENT_TRACE_DEBUG", "true");

        let settings = ClientSettings::from_env().unwrap();
        assert_eq!(settings.vault.base_url(), "https://vault.internal:8200/v2");
        assert_eq!(settings.timeout_seconds, 5);
        assert_eq!(
            settings.observability.trace_endpoint.as_deref(),
            Some("http://collector:4318/v1/traces")
        );
        assert_eq!(settings.observability.trace_sample_rate, 0.5);
        assert!(settings.observability.trace_debug);

        clear_env();
    }

    #[test]
    fn test_from_env_invalid_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("VAULT_CLIENT_TIMEOUT_SECONDS", "soon");
        assert!(ClientSettings::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            r#"
timeout_seconds = 12

[vault]
destination = "http://10.0.0.5:8200"
api_version = "v1"

[observability]
service_name = "unsealer"
trace_debug = true
"#,
        )
        .unwrap();

        let settings = ClientSettings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.vault.base_url(), "http://10.0.0.5:8200/v1");
        assert_eq!(settings.timeout_seconds, 12);
        assert_eq!(settings.observability.service_name, "unsealer");
        assert!(settings.observability.trace_debug);
        assert_eq!(settings.observability.log_level, "info");
    }

    #[test]
    fn test_load_rejects_invalid_destination() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            r#"
[vault]
destination = "vault-without-scheme"
api_version = "v1"
"#,
        )
        .unwrap();

        assert!(ClientSettings::load(Some(path.as_path())).is_err());
    }
}
