use serde::{Deserialize, Serialize};

/// Response envelope every backend endpoint wraps its payload in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            code: None,
            message: None,
            result: Some(result),
        }
    }
}

/// `result` payload of the login and refresh endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenResponse {
    /// Non-empty token, if the backend sent one.
    pub fn into_token(self) -> Option<String> {
        self.token.filter(|t| !t.trim().is_empty())
    }
}
