use std::fmt;
use std::sync::Arc;

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use shared::types::{ApiEnvelope, TokenResponse};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::expiry::is_expired;
use super::store::TokenStore;
use crate::events::{LogoutReason, SessionEvent, SessionEvents};
use crate::transport::{HttpRequest, Transport, TransportError};

/// Why a refresh attempt did not produce a token.
#[derive(Debug)]
enum RefreshFailure {
    Status(StatusCode),
    Network(TransportError),
    MissingToken,
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "refresh endpoint returned {}", status),
            Self::Network(e) => write!(f, "{}", e),
            Self::MissingToken => write!(f, "refresh response carried no token"),
        }
    }
}

/// Mints a new session token from the refresh cookie.
///
/// # Outcome
/// Success stores the new token and returns it. Any failure (non-2xx,
/// transport error, no token in the body) clears the token store and
/// returns `None`; nothing is thrown.
///
/// # Coalescing
/// With coalescing on, attempts are serialized. A caller that queued
/// behind another refresh re-reads the store first and reuses the token the
/// other caller obtained, so a rotating refresh cookie is spent only once.
pub struct RefreshFlow<T> {
    transport: Arc<T>,
    store: TokenStore,
    events: SessionEvents,
    url: String,
    coalesce: bool,
    gate: Mutex<()>,
}

impl<T: Transport> RefreshFlow<T> {
    pub fn new(
        transport: Arc<T>,
        store: TokenStore,
        events: SessionEvents,
        url: impl Into<String>,
        coalesce: bool,
    ) -> Self {
        Self {
            transport,
            store,
            events,
            url: url.into(),
            coalesce,
            gate: Mutex::new(()),
        }
    }

    /// Unconditionally ask the backend for a new token.
    pub async fn refresh(&self) -> Option<String> {
        let _guard = if self.coalesce {
            Some(self.gate.lock().await)
        } else {
            None
        };
        self.request().await
    }

    /// Refresh because `stale` was found expired or rejected. When a
    /// concurrent caller has already replaced it with a live token, that
    /// token is returned without another round trip.
    pub async fn refresh_stale(&self, stale: Option<&str>) -> Option<String> {
        if !self.coalesce {
            return self.request().await;
        }

        let _guard = self.gate.lock().await;
        match self.store.read() {
            Ok(Some(current)) if Some(current.as_str()) != stale && !is_expired(&current) => {
                debug!("Session already refreshed by a concurrent call");
                return Some(current);
            }
            Ok(_) => {}
            Err(e) => warn!("Could not re-read session before refresh: {}", e),
        }

        self.request().await
    }

    async fn request(&self) -> Option<String> {
        info!("Refreshing session token");

        match self.exchange().await {
            Ok(token) => {
                if let Err(e) = self.store.save_token(&token) {
                    error!("Refreshed token could not be stored: {}", e);
                }
                info!("Session token refreshed");
                self.events.emit(SessionEvent::Refreshed);
                Some(token)
            }
            Err(failure) => {
                warn!("Token refresh failed: {}", failure);
                if let Err(e) = self.store.clear() {
                    error!("Failed to clear session after refresh failure: {}", e);
                }
                self.events.emit(SessionEvent::LoggedOut {
                    reason: LogoutReason::RefreshFailed,
                });
                None
            }
        }
    }

    async fn exchange(&self) -> Result<String, RefreshFailure> {
        // No Authorization header: the refresh cookie is the only credential.
        let mut request = HttpRequest::new(Method::POST, self.url.as_str());
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self
            .transport
            .send(request)
            .await
            .map_err(RefreshFailure::Network)?;

        if !response.is_success() {
            return Err(RefreshFailure::Status(response.status));
        }

        let envelope: ApiEnvelope<TokenResponse> =
            serde_json::from_slice(&response.body).map_err(|_| RefreshFailure::MissingToken)?;

        envelope
            .result
            .and_then(TokenResponse::into_token)
            .ok_or(RefreshFailure::MissingToken)
    }
}
