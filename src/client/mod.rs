//! # Vault Client
//!
//! HTTP client for a Vault-compatible secret service.
//!
//! ```rust,no_run
//! use vault_client::client::{InitArgs, RequestOptions, UnsealArgs, VaultService};
//! use vault_client::config::ServiceConfig;
//!
//! # async fn example() -> vault_client::Result<()> {
//! let vault = VaultService::new(ServiceConfig::new("http://127.0.0.1:8200", "v1"))?;
//! let options = RequestOptions::default();
//!
//! let init = vault.init(&InitArgs::new(5, 3), &options).await?;
//! for key in init.keys.iter().take(3) {
//!     vault.unseal(&UnsealArgs::new(key.clone()), &options).await?;
//! }
//!
//! let secret = vault.read("secret/db", init.root_token.expose_secret(), &options).await?;
//! println!("{:?}", secret.data());
//! # Ok(())
//! # }
//! ```

pub mod request;
pub mod service;
pub mod transport;
pub mod types;

pub use request::{build_request, HttpRequest, RequestOptions, TOKEN_HEADER};
pub use service::{classify, error_message, Expect, VaultService};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use types::{
    InitArgs, InitResult, ListResult, ReadResult, SealStatus, SecretEnvelope, StatusResult,
    UnsealArgs, UnsealResult,
};
