//! Settings and credential resolution for the vault-client CLI
//!
//! Command-line flags override the settings file, which overrides the
//! environment.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ClientSettings;
use crate::observability::{Sampled, TraceId};

/// Connection overrides taken from global flags
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_file: Option<PathBuf>,
    pub addr: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Option<u64>,
    pub verbose: bool,
}

/// Resolve client settings
///
/// Sources in priority order:
/// 1. command line flags
/// 2. `--config` settings file plus `VAULT_CLIENT__*` overrides
/// 3. `VAULT_ADDR`, `VAULT_API_VERSION` and `VAULT_CLIENT_*` variables
pub fn resolve_settings(overrides: &SettingsOverrides) -> Result<ClientSettings> {
    let mut settings = match &overrides.config_file {
        Some(path) => {
            debug!("Loading settings from file: {}", path.display());
            ClientSettings::load(Some(path.as_path()))
                .with_context(|| format!("Failed to load settings file: {}", path.display()))?
        }
        None => ClientSettings::from_env().context("Invalid settings in environment")?,
    };

    if let Some(addr) = &overrides.addr {
        debug!("Using address from --addr flag: {}", addr);
        settings.vault.destination = addr.clone();
    }
    if let Some(api_version) = &overrides.api_version {
        settings.vault.api_version = api_version.clone();
    }
    if let Some(timeout) = overrides.timeout {
        debug!("Using timeout from --timeout flag: {} seconds", timeout);
        settings.timeout_seconds = timeout;
    }
    if overrides.verbose {
        settings.observability.log_level = "debug".to_string();
    }

    settings.validate().context("Invalid client settings")?;
    Ok(settings)
}

/// Resolve the access token for token-scoped commands
///
/// Sources in priority order:
/// 1. `--token` flag (or `VAULT_TOKEN`)
/// 2. `--token-file` flag
pub fn resolve_token(token_flag: Option<String>, token_file_flag: Option<&Path>) -> Result<String> {
    if let Some(token) = token_flag.filter(|t| !t.is_empty()) {
        debug!("Using token from --token flag");
        return Ok(token);
    }

    if let Some(token_file) = token_file_flag {
        debug!("Reading token from file: {}", token_file.display());
        let token = std::fs::read_to_string(token_file)
            .with_context(|| format!("Failed to read token file: {}", token_file.display()))?
            .trim()
            .to_string();

        if token.is_empty() {
            anyhow::bail!("Token file is empty: {}", token_file.display());
        }

        return Ok(token);
    }

    anyhow::bail!(
        "No access token found. Please provide a token via:\n\
         - --token flag\n\
         - --token-file flag\n\
         - VAULT_TOKEN environment variable"
    )
}

/// Build a trace identifier from `--trace-id`/`--span-id` style flags
pub fn resolve_trace_id(
    trace_id: Option<&str>,
    span_id: Option<&str>,
    parent_span_id: Option<&str>,
    sampled: Option<bool>,
) -> Result<Option<TraceId>> {
    let (trace_id, span_id) = match (trace_id, span_id) {
        (Some(trace_id), Some(span_id)) => (trace_id, span_id),
        (None, None) => return Ok(None),
        _ => anyhow::bail!("--trace-id and --span-id must be given together"),
    };

    let mut id = TraceId::new(trace_id, span_id).context("Invalid trace identifier")?;
    if let Some(parent) = parent_span_id {
        id = id.with_parent(parent).context("Invalid parent span identifier")?;
    }

    Ok(Some(id.with_sampled(Sampled::from(sampled))))
}
