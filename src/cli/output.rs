//! Output formatting for CLI commands
//!
//! Results print as pretty JSON on stdout. Secrets only ever reach stdout;
//! they are exposed here and nowhere else.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::InitResult;
use crate::secrets::SecretString;

/// Print data as JSON
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Key shares and root token in the shape the service returned them
pub fn init_output(result: &InitResult) -> Value {
    json!({
        "keys": expose_all(&result.keys),
        "keys_base64": expose_all(&result.keys_base64),
        "root_token": result.root_token.expose_secret(),
    })
}

fn expose_all(secrets: &[SecretString]) -> Vec<&str> {
    secrets.iter().map(SecretString::expose_secret).collect()
}
