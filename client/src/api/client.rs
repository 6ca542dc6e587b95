use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::config::validate_config;
use shared::types::{ApiEnvelope, ClientConfig, ConfigError};
use tracing::{debug, error, info, warn};

use crate::auth::{RefreshFlow, TokenStore, is_expired};
use crate::error::ApiError;
use crate::events::SessionEvents;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::transport::{HttpRequest, HttpResponse, HyperTransport, Transport};

// ---------------------------------------------------------------------------
// Call options
// ---------------------------------------------------------------------------

/// How a call uses the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Attach the session token; on a `401` refresh once and retry once, or
    /// fail with [`ApiError::AuthRequired`].
    #[default]
    Required,
    /// Like `Required`, but when the refresh fails the request is retried
    /// once without a token instead of failing. For listings that work
    /// signed out but show more when signed in.
    Optional,
    /// Never attach a token and never refresh.
    Anonymous,
}

/// Method, body and headers of one backend call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub method: Method,
    pub body: Option<Bytes>,
    pub headers: HeaderMap,
    pub auth: AuthMode,
}

impl CallOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: HeaderMap::new(),
            auth: AuthMode::Required,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::InvalidRequest(format!("request body: {}", e)))?;
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Caller headers override the defaults, including `Authorization`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn anonymous(self) -> Self {
        self.auth(AuthMode::Anonymous)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The single choke point for backend calls.
///
/// # Token selection
/// The stored token is used as-is while it is locally live. An expired one
/// is refreshed before the request goes out.
///
/// # Recovery
/// A `401` triggers exactly one refresh and, if that yields a token, exactly
/// one retry whose outcome is returned unchanged. Other non-2xx statuses
/// are returned as [`ApiError::Http`] without retrying.
pub struct AuthClient<T> {
    transport: Arc<T>,
    base_url: String,
    store: TokenStore,
    refresher: RefreshFlow<T>,
    events: SessionEvents,
    config: ClientConfig,
}

impl AuthClient<HyperTransport> {
    /// Client over plain HTTP with storage chosen by `storage.path`.
    ///
    /// The config is validated first. `HyperTransport` has no TLS connector,
    /// so an `https://` base URL is rejected here; use [`AuthClient::new`]
    /// with a TLS-capable [`Transport`] for those backends.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        validate_config(&config)?;
        let base_url = config.api.resolved_base_url();
        if !base_url.starts_with("http://") {
            error!("Refusing base URL {} without a TLS transport", base_url);
            return Err(ConfigError::InvalidConfig(format!(
                "the built-in transport only speaks http://, got {:?}",
                base_url
            )));
        }

        let storage: Arc<dyn KeyValueStorage> = match &config.storage.path {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        let transport = Arc::new(HyperTransport::new(config.api.timeout()));
        Ok(Self::new(transport, storage, config))
    }
}

impl<T: Transport> AuthClient<T> {
    pub fn new(transport: Arc<T>, storage: Arc<dyn KeyValueStorage>, config: ClientConfig) -> Self {
        let base_url = config.api.resolved_base_url();
        let store = TokenStore::new(storage, &config.storage);
        let events = SessionEvents::default();
        let refresher = RefreshFlow::new(
            transport.clone(),
            store.clone(),
            events.clone(),
            join_url(&base_url, &config.auth.refresh_path),
            config.auth.coalesce_refresh,
        );

        info!("API client ready for {}", base_url);

        Self {
            transport,
            base_url,
            store,
            refresher,
            events,
            config,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    /// Ask the backend for a new token right now.
    pub async fn refresh(&self) -> Option<String> {
        self.refresher.refresh().await
    }

    /// A token that is live as far as the client can tell, refreshing an
    /// expired one first. `None` means there is no session.
    pub async fn get_valid_token(&self) -> Result<Option<String>, ApiError> {
        let Some(token) = self.store.read()? else {
            return Ok(None);
        };

        if !is_expired(&token) {
            return Ok(Some(token));
        }

        debug!("Stored token expired, refreshing before request");
        Ok(self.refresher.refresh_stale(Some(token.as_str())).await)
    }

    /// Issue a call and return the response body as JSON.
    pub async fn call(&self, endpoint: &str, options: CallOptions) -> Result<Value, ApiError> {
        let response = self.execute(endpoint, &options).await?;
        parse_body(&response)
    }

    /// Issue a call and decode the backend envelope.
    pub async fn call_envelope<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: CallOptions,
    ) -> Result<ApiEnvelope<R>, ApiError> {
        let value = self.call(endpoint, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Issue a call and return the envelope's `result`, which must be present.
    pub async fn call_result<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: CallOptions,
    ) -> Result<R, ApiError> {
        self.call_envelope(endpoint, options)
            .await?
            .result
            .ok_or_else(|| ApiError::Parse(format!("{} returned no result", endpoint)))
    }

    async fn execute(&self, endpoint: &str, options: &CallOptions) -> Result<HttpResponse, ApiError> {
        let url = self.url(endpoint);

        let token = match options.auth {
            AuthMode::Anonymous => None,
            AuthMode::Required | AuthMode::Optional => self.get_valid_token().await?,
        };

        let response = self.send(&url, options, token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED || options.auth == AuthMode::Anonymous {
            return ensure_success(response);
        }

        warn!("{} {} rejected with 401, refreshing session", options.method, endpoint);

        match self.refresher.refresh_stale(token.as_deref()).await {
            Some(fresh) => {
                info!("Retrying {} {} with refreshed token", options.method, endpoint);
                ensure_success(self.send(&url, options, Some(fresh.as_str())).await?)
            }
            None if options.auth == AuthMode::Optional => {
                info!("Retrying {} {} without a session", options.method, endpoint);
                ensure_success(self.send(&url, options, None).await?)
            }
            None => {
                warn!("Session could not be refreshed, sign-in required");
                Err(ApiError::AuthRequired)
            }
        }
    }

    /// Send once with exactly `token`, no refresh and no retry.
    pub(crate) async fn send(
        &self,
        url: &str,
        options: &CallOptions,
        token: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let request = build_request(url, options, token)?;
        Ok(self.transport.send(request).await?)
    }
}

// ---------------------------------------------------------------------------
// Request / response helpers
// ---------------------------------------------------------------------------

pub(crate) fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn build_request(
    url: &str,
    options: &CallOptions,
    token: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    let mut request = HttpRequest::new(options.method.clone(), url);
    request.body = options.body.clone();

    let headers = &mut request.headers;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidRequest("token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, value);
    }
    for (name, value) in &options.headers {
        headers.insert(name.clone(), value.clone());
    }

    Ok(request)
}

fn ensure_success(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }

    Err(ApiError::Http {
        status: response.status.as_u16(),
        message: error_message(&response),
    })
}

/// Backend `message` field, else the raw body, else a generic status line.
fn error_message(response: &HttpResponse) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ApiEnvelope<Value>>(&response.body) {
        if let Some(message) = envelope.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }

    let text = String::from_utf8_lossy(&response.body);
    let text = text.trim();
    if !text.is_empty() && !text.starts_with('{') {
        return text.to_string();
    }

    format!("HTTP error! status: {}", response.status.as_u16())
}

fn parse_body(response: &HttpResponse) -> Result<Value, ApiError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base(base_url: &str) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url.to_string();
        config
    }

    #[test]
    fn from_config_rejects_https_base_url() {
        let err = AuthClient::from_config(config_with_base("https://api.example.com/TopCV"))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidConfig(ref msg) if msg.contains("http://")));
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let mut config = config_with_base("http://localhost:8080/TopCV");
        config.api.timeout_secs = 0;
        assert!(AuthClient::from_config(config).is_err());
    }

    #[tokio::test]
    async fn from_config_accepts_plain_http() {
        let client = AuthClient::from_config(config_with_base("http://localhost:8080/TopCV")).unwrap();
        assert_eq!(client.url("/api/v1/jobs"), "http://localhost:8080/TopCV/api/v1/jobs");
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h/TopCV", "/api/v1/jobs"), "http://h/TopCV/api/v1/jobs");
        assert_eq!(join_url("http://h/TopCV/", "api/v1/jobs"), "http://h/TopCV/api/v1/jobs");
        assert_eq!(join_url("http://h", "https://other/x"), "https://other/x");
    }

    #[test]
    fn caller_headers_override_defaults() {
        let options = CallOptions::get().header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let request = build_request("http://h/x", &options, Some("t.o.k")).unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "text/plain");
        assert_eq!(request.bearer(), Some("t.o.k"));
        assert!(request.include_credentials);
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let request = build_request("http://h/x", &CallOptions::get(), None).unwrap();
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn error_message_prefers_backend_message() {
        let r = HttpResponse::new(StatusCode::BAD_REQUEST, r#"{"code":1002,"message":"Email invalid"}"#);
        assert_eq!(error_message(&r), "Email invalid");

        let r = HttpResponse::new(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(error_message(&r), "upstream down");

        let r = HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, r#"{"code":9999}"#);
        assert_eq!(error_message(&r), "HTTP error! status: 500");
    }

    #[test]
    fn empty_body_parses_as_null() {
        let r = HttpResponse::new(StatusCode::NO_CONTENT, "  ");
        assert_eq!(parse_body(&r).unwrap(), Value::Null);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let r = HttpResponse::new(StatusCode::OK, "<html>");
        assert!(matches!(parse_body(&r), Err(ApiError::Parse(_))));
    }
}
