//! Last-known user cache.
//!
//! Remembers the signed-in identity across restarts so the UI can show the
//! user before the identity collaborator reports back.
//!
//! Key properties:
//! - Single key (`healthecho_user`), JSON-encoded `UserIdentity`
//! - Backing store is injectable: in-memory or a JSON file on disk
//! - An unreadable cached entry is treated as absent and dropped
//! - A corrupt store file is replaced on the next write

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::UserIdentity;

/// Storage key for the cached user.
pub const USER_KEY: &str = "healthecho_user";

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════
// KeyValueStore: get / set / remove
// ═══════════════════════════════════════════════════════════

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;
    fn remove(&self, key: &str) -> Result<(), SessionStoreError>;
}

/// Process-local store. Contents vanish on exit.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// JSON object file, rewritten whole on every change.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, SessionStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Atomic replace via rename.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(
        &self,
        change: impl FnOnce(&mut HashMap<String, String>),
    ) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(SessionStoreError::Corrupt(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Replacing corrupt session store"
                );
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        change(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

// ═══════════════════════════════════════════════════════════
// SessionCache: typed view over the store
// ═══════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn KeyValueStore>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Load the cached user, if any.
    pub fn load_user(&self) -> Result<Option<UserIdentity>, SessionStoreError> {
        let Some(raw) = self.store.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unreadable cached user");
                self.store.remove(USER_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn remember_user(&self, user: &UserIdentity) -> Result<(), SessionStoreError> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &raw)
    }

    pub fn forget_user(&self) -> Result<(), SessionStoreError> {
        self.store.remove(USER_KEY)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
