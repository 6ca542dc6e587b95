//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use client::auth::now_secs;
use client::{AuthClient, HttpRequest, HttpResponse, KeyValueStorage, MemoryStorage, Transport, TransportError};
use http::StatusCode;
use serde_json::{Value, json};
use shared::types::ClientConfig;

pub const BASE: &str = "http://backend.test/TopCV";
pub const LOGIN: &str = "/api/v1/auth/login";
pub const REFRESH: &str = "/api/v1/auth/refresh";
pub const LOGOUT: &str = "/api/v1/auth/logout";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Unsigned token with the given expiry and role claim.
pub fn make_token(exp: i64, scope: &str) -> String {
    make_token_with(json!({
        "sub": "alice@example.com",
        "iat": now_secs() - 10,
        "exp": exp,
        "scope": scope,
    }))
}

pub fn make_token_with(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS512","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

pub fn live_token(scope: &str) -> String {
    make_token(now_secs() + 3600, scope)
}

pub fn expired_token(scope: &str) -> String {
    make_token(now_secs() - 60, scope)
}

pub fn token_envelope(token: &str) -> Value {
    json!({ "code": 1000, "result": { "token": token } })
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

enum Scripted {
    Respond(StatusCode, String),
    NetworkError,
}

/// Transport answering from per-path queues and recording every request.
///
/// An exhausted (or unscripted) path answers `404`.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) -> &Self {
        let body = if body.is_null() { String::new() } else { body.to_string() };
        self.respond_raw(path, status, &body)
    }

    pub fn respond_raw(&self, path: &str, status: u16, body: &str) -> &Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(path, Scripted::Respond(status, body.to_string()));
        self
    }

    pub fn fail(&self, path: &str) -> &Self {
        self.push(path, Scripted::NetworkError);
        self
    }

    pub fn delay(&self, path: &str, delay: Duration) -> &Self {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
        self
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        let url = format!("{}{}", BASE, path);
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }

    pub fn calls(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request
            .url
            .strip_prefix(BASE)
            .unwrap_or(&request.url)
            .to_string();
        self.requests.lock().unwrap().push(request);

        let delay = self.delays.lock().unwrap().get(&path).copied();
        let next = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Scripted::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Scripted::NetworkError) => Err(TransportError::Connect("connection refused".into())),
            None => Ok(HttpResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

// ---------------------------------------------------------------------------
// Client wiring
// ---------------------------------------------------------------------------

pub fn config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = BASE.to_string();
    config
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub client: Arc<AuthClient<ScriptedTransport>>,
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: ClientConfig) -> Harness {
    init_tracing();
    let transport = ScriptedTransport::new();
    let storage = Arc::new(MemoryStorage::new());
    let client = Arc::new(AuthClient::new(transport.clone(), storage.clone(), config));
    Harness {
        transport,
        storage,
        client,
    }
}

impl Harness {
    pub fn stored_token(&self) -> Option<String> {
        self.storage.get("access_token").unwrap()
    }

    pub fn stored_role_tag(&self) -> Option<String> {
        self.storage.get("user_type").unwrap()
    }

    pub fn seed(&self, token: &str, role_tag: &str) {
        self.storage.set("access_token", token).unwrap();
        self.storage.set("user_type", role_tag).unwrap();
    }
}
