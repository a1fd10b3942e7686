// Durable storage of the {token, user} pair that makes up a login session.
//
// All reads and writes of session state go through `SessionStore`; the
// storage backend is injectable so tests never need a real filesystem.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::models::User;

const TOKEN_KEY: &str = "auth_token";
const USER_KEY: &str = "user";

/// Minimal string key-value backend. Implementations must never panic on
/// IO problems; an unreadable value is reported as absent.
pub trait SessionStorage: Send + Sync + 'static {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Default backend: process-local, lost on exit.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// JSON-file backend so a session survives process restarts. All IO is
/// best-effort: a failed read or write logs a warning and otherwise behaves
/// as if the value were absent.
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!("Ignoring corrupt session file {:?}: {}", path, err);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let raw = match serde_json::to_string(entries) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("Failed to serialize session state: {}", err);
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, raw) {
            tracing::warn!("Failed to persist session file {:?}: {}", self.path, err);
        }
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write();
        entries.remove(key);
        self.persist(&entries);
    }
}

/// The single seam for session state. Token and user are always written and
/// cleared together by callers on auth transitions; readers never observe
/// one without being able to observe the other from the same store.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// `None` when no session exists. Never fails.
    pub fn token(&self) -> Option<String> {
        self.storage.read(TOKEN_KEY)
    }

    /// `None` when absent or unreadable. A corrupt stored user is treated
    /// as no user rather than an error.
    pub fn user(&self) -> Option<User> {
        let raw = self.storage.read(USER_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn set_token(&self, token: &str) {
        self.storage.write(TOKEN_KEY, token);
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.storage.write(USER_KEY, &raw),
            Err(err) => tracing::warn!("Failed to serialize session user: {}", err),
        }
    }

    /// Stores both halves of a session. Successful auth always goes through
    /// here so token and user stay paired.
    pub fn store_session(&self, token: &str, user: &User) {
        self.set_token(token);
        self.set_user(user);
    }

    /// Removes both token and user. Subsequent reads see an empty session.
    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}
