//! # Command Line Interface
//!
//! `vault-client` drives the seal lifecycle and secret operations of a
//! Vault-compatible service from the shell. Every invocation runs one
//! operation inside its own trace span and forwards the trace context as B3
//! headers.

pub mod config;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use opentelemetry::trace::{Span as _, Tracer as _};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{InitArgs, RequestOptions, UnsealArgs, VaultService};
use crate::config::ClientSettings;
use crate::observability::{
    headers_for_trace_id, init_logging, log_config_info, ServiceTracer, TraceId, TracerConfig,
    TracerRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "vault-client")]
#[command(about = "Seal lifecycle and secret operations against a Vault-compatible service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service address, e.g. http://127.0.0.1:8200
    #[arg(long, global = true)]
    pub addr: Option<String>,

    /// API version path segment
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Access token for token-scoped commands
    #[arg(long, global = true, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to file containing the access token
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Trace id to propagate (16 or 32 hex characters)
    #[arg(long, global = true, requires = "span_id")]
    pub trace_id: Option<String>,

    /// Span id to propagate (16 hex characters)
    #[arg(long, global = true, requires = "trace_id")]
    pub span_id: Option<String>,

    /// Parent span id to propagate
    #[arg(long, global = true, requires = "trace_id")]
    pub parent_span_id: Option<String>,

    /// Sampling decision to propagate with --trace-id; omitted when not given
    #[arg(long, global = true, requires = "trace_id")]
    pub sampled: Option<bool>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show whether the service is initialized
    Status,

    /// Initialize the service and print the key shares and root token
    Init {
        /// Number of key shares to generate
        #[arg(long, default_value_t = 5)]
        shares: u32,

        /// Number of shares required to unseal
        #[arg(long, default_value_t = 3)]
        threshold: u32,
    },

    /// Show seal state and unseal progress
    SealStatus,

    /// Seal the service
    Seal,

    /// Submit one key share
    Unseal {
        /// Key share
        #[arg(required_unless_present = "reset")]
        key: Option<String>,

        /// Discard the shares submitted so far
        #[arg(long)]
        reset: bool,
    },

    /// Read the secret at a path
    Read {
        /// Secret path, e.g. secret/db
        path: String,
    },

    /// List the keys under the secret mount
    List,

    /// Write a JSON document to a path
    Write {
        /// Secret path, e.g. secret/db
        path: String,

        /// JSON document, e.g. '{"password":"hunter2"}'
        json: String,
    },
}

impl Commands {
    /// Operation name used for the trace span
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Status => "status",
            Commands::Init { .. } => "init",
            Commands::SealStatus => "seal_status",
            Commands::Seal => "seal",
            Commands::Unseal { .. } => "unseal",
            Commands::Read { .. } => "read",
            Commands::List => "list",
            Commands::Write { .. } => "write",
        }
    }

    pub fn requires_token(&self) -> bool {
        matches!(
            self,
            Commands::Seal | Commands::Read { .. } | Commands::List | Commands::Write { .. }
        )
    }
}

/// What a command prints on success
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Json(Value),
    Message(String),
}

impl Cli {
    fn overrides(&self) -> config::SettingsOverrides {
        config::SettingsOverrides {
            config_file: self.config.clone(),
            addr: self.addr.clone(),
            api_version: self.api_version.clone(),
            timeout: self.timeout,
            verbose: self.verbose,
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse()).await
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = config::resolve_settings(&cli.overrides())?;
    initialise_logging(&settings)?;
    log_config_info(&settings);

    let token = if cli.command.requires_token() {
        config::resolve_token(cli.token.clone(), cli.token_file.as_deref())?
    } else {
        String::new()
    };
    let explicit_trace = config::resolve_trace_id(
        cli.trace_id.as_deref(),
        cli.span_id.as_deref(),
        cli.parent_span_id.as_deref(),
        cli.sampled,
    )?;

    let vault = VaultService::from_settings(&settings)?;
    let registry = Arc::new(TracerRegistry::new());
    let tracer = create_tracer(Arc::clone(&registry), &settings).await?;

    let otel_tracer = tracer.tracer();
    let mut span = otel_tracer.start(cli.command.name());
    let trace_id = explicit_trace.or_else(|| TraceId::from_span_context(span.span_context()));
    let trace_headers = headers_for_trace_id(trace_id.as_ref());
    let options = RequestOptions::new().with_trace_headers(&trace_headers);

    let result = execute_command(&cli.command, &vault, &token, &options).await;
    span.end();

    shutdown_tracers(registry).await;

    match result? {
        CommandOutput::Json(value) => output::print_json(&value)?,
        CommandOutput::Message(message) => println!("{}", message),
    }
    Ok(())
}

/// Execute one command against the service
pub async fn execute_command(
    command: &Commands,
    vault: &VaultService,
    token: &str,
    options: &RequestOptions,
) -> anyhow::Result<CommandOutput> {
    debug!(command = command.name(), "Executing command");

    let output = match command {
        Commands::Status => {
            CommandOutput::Json(serde_json::to_value(vault.status(options).await?)?)
        }
        Commands::Init { shares, threshold } => {
            let result = vault.init(&InitArgs::new(*shares, *threshold), options).await?;
            CommandOutput::Json(output::init_output(&result))
        }
        Commands::SealStatus => {
            CommandOutput::Json(serde_json::to_value(vault.seal_status(options).await?)?)
        }
        Commands::Seal => {
            vault.seal(token, options).await?;
            CommandOutput::Message("Service sealed".to_string())
        }
        Commands::Unseal { key, reset } => {
            let args = match (reset, key) {
                (true, _) => UnsealArgs::reset_progress(),
                (false, Some(key)) => UnsealArgs::new(key.as_str()),
                (false, None) => anyhow::bail!("A key share is required unless --reset is given"),
            };
            CommandOutput::Json(serde_json::to_value(vault.unseal(&args, options).await?)?)
        }
        Commands::Read { path } => {
            CommandOutput::Json(serde_json::to_value(vault.read(path, token, options).await?)?)
        }
        Commands::List => {
            CommandOutput::Json(serde_json::to_value(vault.list(token, options).await?)?)
        }
        Commands::Write { path, json } => {
            let value: Value =
                serde_json::from_str(json).context("Secret value must be a JSON document")?;
            vault.write(path, &value, token, options).await?;
            CommandOutput::Message(format!("Wrote {}", path))
        }
    };

    Ok(output)
}

/// Build the tracer off the async runtime.
///
/// The OTLP exporter owns a blocking HTTP client.
async fn create_tracer(
    registry: Arc<TracerRegistry>,
    settings: &ClientSettings,
) -> anyhow::Result<Arc<ServiceTracer>> {
    let observability = settings.observability.clone();
    let tracer = tokio::task::spawn_blocking(move || {
        registry.get_or_create(
            &observability.service_name,
            &TracerConfig::from_observability(&observability),
        )
    })
    .await
    .context("Tracer setup task failed")??;

    Ok(tracer)
}

async fn shutdown_tracers(registry: Arc<TracerRegistry>) {
    match tokio::task::spawn_blocking(move || registry.shutdown_all()).await {
        Ok(Ok(())) => debug!("Tracers shut down"),
        Ok(Err(e)) => warn!(error = %e, "Failed to flush traces"),
        Err(e) => warn!(error = %e, "Tracer shutdown task failed"),
    }
}

fn initialise_logging(settings: &ClientSettings) -> anyhow::Result<()> {
    // An already-installed subscriber (e.g. integration tests) is fine.
    init_logging(&settings.observability)?;
    Ok(())
}
