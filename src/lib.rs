//! # vault-client
//!
//! Async client for a Vault-compatible secret service: the seal lifecycle
//! (`status`, `init`, `seal_status`, `seal`, `unseal`) and token-scoped
//! secret operations (`read`, `list`, `write`).
//!
//! ## Architecture
//!
//! ```text
//! RequestOptions ─┐
//! computed fields ├─ deep merge ─→ HttpRequest ─→ Transport ─→ classification
//! token header  ──┘
//! ```
//!
//! - **Client**: [`client::VaultService`], one request/response exchange per call
//! - **Merge layer**: [`utils::deep_merge`] combines caller options with computed fields
//! - **Trace context**: B3 header propagation and per-service OpenTelemetry tracers
//! - **Secrets**: [`secrets::SecretString`] keeps tokens and key shares out of logs
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vault_client::{client::RequestOptions, ClientSettings, Result, VaultService};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = ClientSettings::from_env()?;
//!     let vault = VaultService::from_settings(&settings)?;
//!
//!     let status = vault.seal_status(&RequestOptions::default()).await?;
//!     println!("sealed: {}", status.sealed);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod utils;

// Re-export commonly used types
pub use client::{RequestOptions, VaultService};
pub use config::{ClientSettings, ServiceConfig};
pub use errors::{Result, VaultError};
pub use observability::{headers_for_trace_id, Sampled, TraceId, TracerRegistry};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
