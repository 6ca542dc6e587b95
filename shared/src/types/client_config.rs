use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "JOBBOARD_API_URL";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// JSON file holding the persisted session. `None` keeps the session in
    /// memory only.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_token_key")]
    pub token_key: String,
    #[serde(default = "default_role_key")]
    pub role_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Let concurrent callers share one refresh instead of each rotating the
    /// refresh cookie on their own.
    #[serde(default = "default_coalesce_refresh")]
    pub coalesce_refresh: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ApiConfig {
    /// Base URL with `JOBBOARD_API_URL` taking priority over the config
    /// file field. Trailing slashes are stripped.
    pub fn resolved_base_url(&self) -> String {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok(), &self.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `env` wins when it is set and non-empty.
pub fn resolve_base_url(env: Option<String>, configured: &str) -> String {
    env.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            token_key: default_token_key(),
            role_key: default_role_key(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            coalesce_refresh: default_coalesce_refresh(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_base_url() -> String {
    "http://localhost:8080/TopCV".to_string()
}

pub fn default_timeout_secs() -> u64 {
    10
}

pub fn default_token_key() -> String {
    "access_token".to_string()
}

pub fn default_role_key() -> String {
    "user_type".to_string()
}

pub fn default_login_path() -> String {
    "/api/v1/auth/login".to_string()
}

pub fn default_refresh_path() -> String {
    "/api/v1/auth/refresh".to_string()
}

pub fn default_logout_path() -> String {
    "/api/v1/auth/logout".to_string()
}

pub fn default_coalesce_refresh() -> bool {
    true
}
