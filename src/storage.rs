//! Durable key/value storage
//!
//! Stands in for the platform's defaults database. Each key is a whole
//! blob: a `set` replaces the previous value in one step, so a reader
//! never observes a partially written value.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StorageError;

/// Key under which the web-view bridge stores the user's session token
pub const SESSION_TOKEN_KEY: &str = "FanMakerSDKSessionToken";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(self.key_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.key_path(key);
        // Write beside the target, then rename over it
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Read the session token; empty or unreadable counts as absent
pub fn session_token(store: &dyn KeyValueStore) -> Option<String> {
    let bytes = store.get(SESSION_TOKEN_KEY).ok().flatten()?;
    let token: String = serde_json::from_slice(&bytes).ok()?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub fn set_session_token(store: &dyn KeyValueStore, token: &str) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(token)?;
    store.set(SESSION_TOKEN_KEY, &bytes)
}

pub fn clear_session_token(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(SESSION_TOKEN_KEY)
}
