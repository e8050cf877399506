//! Shared helpers for integration tests
//!
//! Provides a wiremock-backed stand-in for the secret service and clients
//! pointed at it.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use vault_client::config::ServiceConfig;
use vault_client::VaultService;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ROOT_TOKEN: &str = "s.7Hc1rootTokenFixture";

/// Client addressing `server` with API version `v1`
pub fn client_for(server: &MockServer) -> VaultService {
    VaultService::new(ServiceConfig::new(server.uri(), "v1")).expect("valid client config")
}

/// Client addressing a port nothing listens on
pub fn unreachable_client() -> VaultService {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    };
    VaultService::new(ServiceConfig::new(format!("http://127.0.0.1:{}", port), "v1"))
        .expect("valid client config")
}

/// Answer `verb path` with `status` and an optional JSON body
pub async fn mount_json(
    server: &MockServer,
    verb: &str,
    endpoint: &str,
    status: u16,
    body: Option<Value>,
) {
    let mut response = ResponseTemplate::new(status);
    if let Some(body) = body {
        response = response.set_body_json(body);
    }

    Mock::given(method(verb)).and(path(endpoint)).respond_with(response).mount(server).await;
}

/// Answer every request with `status` and an `errors` body
pub async fn mount_failure(server: &MockServer, status: u16, message: &str) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "errors": [message] })))
        .mount(server)
        .await;
}

/// In-memory seal state behind the mocked lifecycle endpoints
#[derive(Debug)]
struct SealState {
    initialized: bool,
    sealed: bool,
    threshold: u32,
    shares: Vec<String>,
    submitted: HashSet<String>,
}

impl SealState {
    fn seal_status(&self) -> Value {
        json!({
            "sealed": self.sealed,
            "t": self.threshold,
            "n": self.shares.len(),
            "progress": if self.sealed { self.submitted.len() } else { 0 },
            "version": "1.15.0"
        })
    }
}

/// A stateful mock: init hands out shares, unseal counts distinct valid
/// shares, and secret endpoints require the root token once unsealed.
pub async fn start_stateful_vault() -> MockServer {
    let server = MockServer::start().await;
    let state = Arc::new(Mutex::new(SealState {
        initialized: false,
        sealed: true,
        threshold: 0,
        shares: Vec::new(),
        submitted: HashSet::new(),
    }));

    let init_state = Arc::clone(&state);
    Mock::given(method("GET"))
        .and(path("/v1/sys/init"))
        .respond_with(move |_: &Request| {
            let state = init_state.lock().unwrap();
            ResponseTemplate::new(200).set_body_json(json!({ "initialized": state.initialized }))
        })
        .mount(&server)
        .await;

    let init_state = Arc::clone(&state);
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(move |req: &Request| {
            let mut state = init_state.lock().unwrap();
            if state.initialized {
                return ResponseTemplate::new(400)
                    .set_body_json(json!({ "errors": ["Vault is already initialized"] }));
            }

            let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
            let shares = body["secret_shares"].as_u64().unwrap_or(0) as usize;
            let threshold = body["secret_threshold"].as_u64().unwrap_or(0) as u32;

            state.initialized = true;
            state.threshold = threshold;
            state.shares = (0..shares).map(|i| format!("key-share-{:02}", i)).collect();

            ResponseTemplate::new(200).set_body_json(json!({
                "keys": state.shares,
                "keys_base64": state.shares,
                "root_token": ROOT_TOKEN
            }))
        })
        .mount(&server)
        .await;

    let status_state = Arc::clone(&state);
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(move |_: &Request| {
            let state = status_state.lock().unwrap();
            ResponseTemplate::new(200).set_body_json(state.seal_status())
        })
        .mount(&server)
        .await;

    let unseal_state = Arc::clone(&state);
    Mock::given(method("PUT"))
        .and(path("/v1/sys/unseal"))
        .respond_with(move |req: &Request| {
            let mut state = unseal_state.lock().unwrap();
            let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();

            if body["reset"].as_bool() == Some(true) {
                state.submitted.clear();
                return ResponseTemplate::new(200).set_body_json(state.seal_status());
            }

            let key = body["key"].as_str().unwrap_or_default().to_string();
            if !state.shares.contains(&key) {
                return ResponseTemplate::new(400)
                    .set_body_json(json!({ "errors": ["invalid key share"] }));
            }

            if state.sealed {
                state.submitted.insert(key);
                if state.submitted.len() as u32 >= state.threshold {
                    state.sealed = false;
                    state.submitted.clear();
                }
            }
            ResponseTemplate::new(200).set_body_json(state.seal_status())
        })
        .mount(&server)
        .await;

    let seal_state = Arc::clone(&state);
    Mock::given(method("PUT"))
        .and(path("/v1/sys/seal"))
        .respond_with(move |req: &Request| {
            if !has_root_token(req) {
                return ResponseTemplate::new(403)
                    .set_body_json(json!({ "errors": ["permission denied"] }));
            }
            seal_state.lock().unwrap().sealed = true;
            ResponseTemplate::new(204)
        })
        .mount(&server)
        .await;

    let secret_state = Arc::clone(&state);
    Mock::given(method("GET"))
        .and(path("/v1/secret/db"))
        .respond_with(move |req: &Request| {
            if secret_state.lock().unwrap().sealed {
                return ResponseTemplate::new(503)
                    .set_body_json(json!({ "errors": ["Vault is sealed"] }));
            }
            if !has_root_token(req) {
                return ResponseTemplate::new(403)
                    .set_body_json(json!({ "errors": ["permission denied"] }));
            }
            ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "5e1b2c7a-0000-4000-8000-000000000001",
                "lease_id": "",
                "lease_duration": 2764800,
                "renewable": false,
                "data": { "password": "hunter2" }
            }))
        })
        .mount(&server)
        .await;

    server
}

fn has_root_token(req: &Request) -> bool {
    req.headers.get("X-Vault-Token").and_then(|v| v.to_str().ok()) == Some(ROOT_TOKEN)
}
