//! # Configuration Management
//!
//! Settings for the Vault client: where the service lives, the default request
//! timeout, and logging/tracer options. Settings come from environment
//! variables ([`ClientSettings::from_env`]) or from a settings file layered
//! with environment overrides ([`ClientSettings::load`]).

pub mod settings;

pub use settings::{ClientSettings, ObservabilityConfig, ServiceConfig};
