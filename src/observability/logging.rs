//! # Structured Logging
//!
//! Subscriber setup and span macros for the Vault client.
//!
//! Client operations log the method, URI and response status. Tokens, key
//! shares and root tokens never appear in log fields: they travel in headers
//! and [`SecretString`](crate::secrets::SecretString) values, neither of which
//! is recorded.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::Result;

/// Create a tracing span for one client operation.
///
/// ```rust,ignore
/// let span = vault_span!("unseal", "PUT");
/// let span = vault_span!("read", "GET", path = "secret/db");
/// ```
#[macro_export]
macro_rules! vault_span {
    ($operation:expr, $method:expr) => {
        tracing::info_span!(
            "vault_request",
            operation = %$operation,
            method = %$method,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $method:expr, $($field:tt)*) => {
        tracing::info_span!(
            "vault_request",
            operation = %$operation,
            method = %$method,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `Ok(false)`
/// when a global subscriber was already installed (e.g. by a test harness).
pub fn init_logging(config: &ObservabilityConfig) -> Result<bool> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.json_logging {
        tracing::subscriber::set_global_default(
            fmt().json().with_env_filter(filter).with_current_span(true).finish(),
        )
        .is_ok()
    } else {
        tracing::subscriber::set_global_default(fmt().with_env_filter(filter).finish()).is_ok()
    };

    if installed {
        tracing::debug!(
            service_name = %config.service_name,
            log_level = %config.log_level,
            json = config.json_logging,
            "Logging initialized"
        );
    }

    Ok(installed)
}

/// Log the effective client configuration at startup
pub fn log_config_info(settings: &crate::config::ClientSettings) {
    tracing::info!(
        base_url = %settings.vault.base_url(),
        timeout_seconds = settings.timeout_seconds,
        trace_endpoint = ?settings.observability.trace_endpoint,
        trace_debug = settings.observability.trace_debug,
        "Vault client configuration"
    );
}
