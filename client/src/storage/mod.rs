//! Durable key/value backends for the token store.

pub mod file;
pub mod memory;

use thiserror::Error;

pub use self::file::FileStorage;
pub use self::memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt storage file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// String-keyed, string-valued storage surviving between runs (or not, for
/// [`MemoryStorage`]).
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
