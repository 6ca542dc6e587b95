use std::fmt;
use std::sync::Arc;

use shared::types::{RoleClass, StorageConfig};
use tracing::{debug, warn};

use super::role::role_of;
use crate::storage::{KeyValueStorage, StorageError};

/// Single source of truth for the current session token and the tag of the
/// login flow that produced it.
///
/// Cloning shares the underlying storage; every clone sees the same session.
/// Concurrent writers follow last-writer-wins.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    token_key: String,
    role_key: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: &StorageConfig) -> Self {
        Self::with_keys(storage, &config.token_key, &config.role_key)
    }

    pub fn with_keys(storage: Arc<dyn KeyValueStorage>, token_key: &str, role_key: &str) -> Self {
        Self {
            storage,
            token_key: token_key.to_string(),
            role_key: role_key.to_string(),
        }
    }

    pub fn save(&self, token: &str, role: RoleClass) -> Result<(), StorageError> {
        self.storage.set(&self.token_key, token)?;
        self.storage.set(&self.role_key, role.tag())?;
        debug!("Stored session token for {} login", role);
        Ok(())
    }

    /// Replace the token, keeping the remembered role tag.
    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(&self.token_key, token)
    }

    /// Stored token; an empty value counts as absent.
    pub fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .storage
            .get(&self.token_key)?
            .filter(|token| !token.is_empty()))
    }

    /// Remove both keys. Both removals are attempted even if the first fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        let token = self.storage.remove(&self.token_key);
        let role = self.storage.remove(&self.role_key);
        debug!("Cleared stored session");
        token.and(role)
    }

    /// Whether any token is stored, valid or not. Storage failures read as
    /// "no".
    pub fn is_present(&self) -> bool {
        match self.read() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!("Could not read session token: {}", e);
                false
            }
        }
    }

    /// Which login flow last succeeded. Not an authorization input; use
    /// [`Self::stored_role`] for that.
    pub fn role_class(&self) -> Result<Option<RoleClass>, StorageError> {
        Ok(self
            .storage
            .get(&self.role_key)?
            .as_deref()
            .and_then(RoleClass::from_tag))
    }

    /// Role claim decoded from the stored token.
    pub fn stored_role(&self) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.as_deref().and_then(role_of))
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("token_key", &self.token_key)
            .field("role_key", &self.role_key)
            .finish_non_exhaustive()
    }
}
