use std::collections::BTreeMap;
use std::sync::Mutex;

use http::HeaderMap;
use http::header::SET_COOKIE;
use tracing::debug;

/// Minimal in-memory cookie jar.
///
/// Holds what the backend sets (notably the HTTP-only refresh credential)
/// and replays it on credentialed requests. Attributes other than
/// `Max-Age=0` are ignored; every cookie is sent to the single configured
/// backend.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: Mutex<BTreeMap<String, String>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a `Cookie` request header, or `None` when the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        let cookies = self.cookies.lock().ok()?;
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Apply every `Set-Cookie` header of a response.
    pub fn store_from(&self, headers: &HeaderMap) {
        for raw in headers.get_all(SET_COOKIE) {
            if let Ok(raw) = raw.to_str() {
                self.store(raw);
            }
        }
    }

    pub fn store(&self, set_cookie: &str) {
        let mut parts = set_cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return;
        }

        let expired = parts.any(|attr| {
            attr.split_once('=')
                .map(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
                .unwrap_or(false)
        });

        let Ok(mut cookies) = self.cookies.lock() else {
            return;
        };
        if expired || value.is_empty() {
            debug!("Cookie {} cleared by server", name);
            cookies.remove(name);
        } else {
            debug!("Cookie {} stored", name);
            cookies.insert(name.to_string(), value.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies
            .lock()
            .map(|c| c.contains_key(name))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut cookies) = self.cookies.lock() {
            cookies.clear();
        }
    }
}
