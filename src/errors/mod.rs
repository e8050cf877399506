//! # Error Handling
//!
//! Error types shared by the Vault client, its transport, configuration and
//! tracing layers.

pub mod types;

pub use types::{Result, VaultError};
