//! Client-side session persistence
//!
//! A [`SessionStore`] is an opaque string key-value store, the moral
//! equivalent of browser local storage. [`Session`] layers the two well-known
//! keys on top of it.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-encoded signed-in user
pub const USER_INFO_KEY: &str = "userInfo";

const TEMP_SUFFIX: &str = ".tmp";

/// String key-value storage behind a [`Session`].
///
/// # Errors
///
/// Every operation fails with a [`CoreError`] when the backing medium cannot
/// be read or written.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Process-local store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, rewritten on every change.
///
/// Writes go to a sibling temp file that is renamed over the store file, and
/// the in-memory map only changes once the write has succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is a directory, or if the file exists but
    /// cannot be read or parsed
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(CoreError::invalid_config(format!(
                "session path {} is a directory",
                path.display()
            )));
        }

        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }

    fn flush(&self, entries: &HashMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    /// Apply `change` to a copy of the entries and keep it once it is on disk
    fn update(
        &self,
        change: impl FnOnce(&mut HashMap<String, String>) -> bool,
    ) -> CoreResult<()> {
        let mut entries = self.entries();
        let mut next = entries.clone();
        if change(&mut next) {
            self.flush(&next)?;
            *entries = next;
        }
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// Shared handle over a [`SessionStore`]
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    #[must_use]
    pub const fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Session kept only in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Current bearer token, if any.
    ///
    /// Storage failures are logged and reported as "no token".
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "failed to read session token");
                None
            }
        }
    }

    /// Store the bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written
    pub fn set_token(&self, token: &str) -> CoreResult<()> {
        self.store.set(TOKEN_KEY, token)
    }

    /// Decode the stored user info
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the value is not valid
    /// JSON for `T`
    pub fn user_info<T: DeserializeOwned>(&self) -> CoreResult<Option<T>> {
        match self.store.get(USER_INFO_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store `user` as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if `user` cannot be serialized or the store cannot be
    /// written
    pub fn set_user_info<T: Serialize>(&self, user: &T) -> CoreResult<()> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_INFO_KEY, &raw)
    }

    /// Remove both the token and the user info.
    ///
    /// Both removals are attempted even if the first one fails.
    ///
    /// # Errors
    ///
    /// Returns the first removal failure
    pub fn clear(&self) -> CoreResult<()> {
        let token = self.store.remove(TOKEN_KEY);
        let user = self.store.remove(USER_INFO_KEY);
        token.and(user)
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.token().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Info {
        id: String,
    }

    #[test]
    fn memory_session_round_trips_token_and_user() {
        let session = Session::in_memory();
        assert_eq!(session.token(), None);

        session.set_token("abc").unwrap();
        session.set_user_info(&Info { id: "u1".into() }).unwrap();

        assert_eq!(session.token().as_deref(), Some("abc"));
        assert_eq!(
            session.user_info::<Info>().unwrap(),
            Some(Info { id: "u1".into() })
        );
    }

    #[test]
    fn clear_removes_both_keys() {
        let store = Arc::new(MemoryStore::new());
        store.set("other", "kept").unwrap();
        let session = Session::new(store.clone());
        session.set_token("abc").unwrap();
        session.set_user_info(&Info { id: "u1".into() }).unwrap();

        session.clear().unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_INFO_KEY).unwrap(), None);
        assert_eq!(store.get("other").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let session = Session::in_memory();
        session.set_token("").unwrap();
        assert_eq!(session.token(), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set(TOKEN_KEY, "persisted").unwrap();
            store.set(USER_INFO_KEY, "{\"id\":\"u1\"}").unwrap();
            store.remove(USER_INFO_KEY).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("persisted"));
        assert_eq!(store.get(USER_INFO_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, CoreError::Serialization { .. }));
    }

    #[test]
    fn file_store_rejects_directory_path() {
        let dir = tempfile::tempdir().unwrap();

        let err = FileStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn file_store_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store.set(TOKEN_KEY, "abc").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, ["session.json"]);
    }

    #[test]
    fn failed_file_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path).unwrap();
        store.set(TOKEN_KEY, "first").unwrap();

        // A directory in place of the file makes the rename fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        assert!(store.set(TOKEN_KEY, "second").is_err());
        assert!(store.remove(TOKEN_KEY).is_err());
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("first"));
        assert!(!dir.path().join("session.json.tmp").exists());
    }
}
