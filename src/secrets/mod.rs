//! Handling for sensitive values returned by or sent to the service.
//!
//! Root tokens and unseal key shares are wrapped in [`SecretString`] so they
//! cannot be logged by accident. The client returns them to the caller and
//! never persists them.

pub mod types;

pub use types::{expose_on_wire, SecretString};
