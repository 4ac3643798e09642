//! Durable persistence of the session across restarts

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tempfile::NamedTempFile;

use crate::auth::types::{Session, User};
use crate::config::StorageKeys;
use crate::error::{Error, Result};

/// String key-value storage with browser storage semantics
///
/// Reads never fail: a backend that cannot produce a value reports it as
/// absent.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| Error::storage("memory storage lock poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| Error::storage("memory storage lock poisoned"))?;
        items.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object in a file
///
/// Every write replaces the file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                log::warn!("cannot read session file {}: {}", self.path.display(), err);
                return HashMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::warn!(
                "ignoring corrupt session file {}: {}",
                self.path.display(),
                err
            );
            HashMap::new()
        })
    }

    fn write_all(&self, items: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_vec_pretty(items)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(Error::storage)?;

        // Unique sibling file, renamed over the target once fully written
        let mut tmp = NamedTempFile::new_in(dir).map_err(Error::storage)?;
        tmp.write_all(&json).map_err(Error::storage)?;
        tmp.as_file().sync_all().map_err(Error::storage)?;
        tmp.persist(&self.path)
            .map_err(|err| Error::storage(err.error))?;
        Ok(())
    }

    fn update<F: FnOnce(&mut HashMap<String, String>) -> bool>(&self, f: F) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| Error::storage("file storage lock poisoned"))?;
        let mut items = self.read_all();
        if f(&mut items) {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.read().ok()?;
        self.read_all().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| items.remove(key).is_some())
    }
}

/// Persists the access token, refresh token and user record
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SessionStorage>,
    keys: StorageKeys,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SessionStorage>, keys: StorageKeys) -> Self {
        Self { storage, keys }
    }

    /// Write all three entries of the session
    pub fn save(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user)?;
        self.storage
            .set_item(&self.keys.access_token, &session.access_token)?;
        self.storage
            .set_item(&self.keys.refresh_token, &session.refresh_token)?;
        self.storage.set_item(&self.keys.user, &user)
    }

    /// Replace only the stored access token
    pub fn save_access_token(&self, access_token: &str) -> Result<()> {
        self.storage.set_item(&self.keys.access_token, access_token)
    }

    /// Reconstruct the persisted session
    ///
    /// Any missing entry, or a user record that does not parse, yields `None`.
    pub fn load(&self) -> Option<Session> {
        let access_token = self.storage.get_item(&self.keys.access_token)?;
        let refresh_token = self.storage.get_item(&self.keys.refresh_token)?;
        let user = self.storage.get_item(&self.keys.user)?;

        match serde_json::from_str::<User>(&user) {
            Ok(user) => Some(Session::new(access_token, refresh_token, user)),
            Err(err) => {
                log::warn!("discarding stored session with unreadable user record: {}", err);
                None
            }
        }
    }

    /// The stored access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.storage.get_item(&self.keys.access_token)
    }

    /// The stored refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get_item(&self.keys.refresh_token)
    }

    /// Remove all three entries; safe to repeat
    ///
    /// Every key is attempted even if an earlier removal fails.
    pub fn clear(&self) -> Result<()> {
        let results = [
            self.storage.remove_item(&self.keys.access_token),
            self.storage.remove_item(&self.keys.refresh_token),
            self.storage.remove_item(&self.keys.user),
        ];
        results.into_iter().collect()
    }

    /// Whether any session entry is present
    pub fn has_entries(&self) -> bool {
        self.storage.get_item(&self.keys.access_token).is_some()
            || self.storage.get_item(&self.keys.refresh_token).is_some()
            || self.storage.get_item(&self.keys.user).is_some()
    }
}
