use std::fs;
use tracing::{debug, error, info};

use crate::types::client_config::{ClientConfig, ConfigError};

pub fn load_config(path: &str) -> Result<ClientConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    parse_config(&contents)
}

/// Parse and validate a TOML document.
pub fn parse_config(contents: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

pub fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let base_url = config.api.resolved_base_url();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidConfig(format!(
            "base_url must start with http:// or https://, got {:?}",
            base_url
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "timeout_secs must be greater than 0".into(),
        ));
    }

    let storage = &config.storage;
    if storage.token_key.is_empty() || storage.role_key.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "storage keys cannot be empty".into(),
        ));
    }
    // Both values live in the same key space.
    if storage.token_key == storage.role_key {
        return Err(ConfigError::InvalidConfig(
            "token_key and role_key must differ".into(),
        ));
    }
    if matches!(storage.path.as_deref(), Some(p) if p.trim().is_empty()) {
        return Err(ConfigError::InvalidConfig(
            "storage path cannot be empty when set".into(),
        ));
    }

    let auth = &config.auth;
    for (name, path) in [
        ("login_path", &auth.login_path),
        ("refresh_path", &auth.refresh_path),
        ("logout_path", &auth.logout_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidConfig(format!(
                "{} must start with '/'",
                name
            )));
        }
    }

    Ok(())
}
