use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{KeyValueStorage, StorageError};

/// Storage backed by a single JSON object on disk.
///
/// The file is read once, on first access, and kept in memory afterwards;
/// lookups never touch the disk again. Every mutation rewrites the whole
/// file through a sibling `.tmp` file and a rename, so a crash mid-write
/// leaves the previous contents intact. A missing file reads as empty.
///
/// # Blocking
/// The first lookup and every `set`/`remove` do synchronous `std::fs` I/O
/// on the calling thread. The file holds two short strings, so this is a
/// few small writes per login, refresh or logout. The file is owned by this
/// process: edits made by others after the first load are not seen.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // `None` until the file has been loaded.
    cache: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        debug!("Loaded {}", self.path.display());
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!("Failed to replace {}: {}", self.path.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!("Wrote {} entries to {}", map.len(), self.path.display());
        Ok(())
    }

    /// Apply `change` to a copy of the map, persist it, then publish it.
    /// The cache is left untouched when the write fails.
    fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut cache = self.cache.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = match cache.as_ref() {
            Some(map) => map.clone(),
            None => self.read_map()?,
        };
        if change(&mut map) {
            self.write_map(&map)?;
        }
        *cache = Some(map);
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut cache = self.cache.lock().map_err(|_| StorageError::Poisoned)?;
        if cache.is_none() {
            *cache = Some(self.read_map()?);
        }
        Ok(cache.as_ref().and_then(|map| map.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|map| map.remove(key).is_some())
    }
}
