//! Client session state.
//!
//! Cart, wishlist and the signed-in account each live in a key-value blob
//! store. State is read once when a session object is loaded and written
//! back after every mutation. A blob that cannot be read or parsed is
//! treated as empty state and logged.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod auth;
pub mod cart;
pub mod wishlist;

pub use auth::AuthSession;
pub use cart::CartSession;
pub use wishlist::WishlistSession;

pub const CART_KEY: &str = "cart";
pub const WISHLIST_KEY: &str = "wishlist";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid session key: {0}")]
    InvalidKey(String),
}

/// Opaque string blobs by key.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileKvStore { dir: PathBuf }

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    fn path(&self, key: &str) -> Result<PathBuf, SessionError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(SessionError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir)?;
        // replace atomically
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        match fs::remove_file(self.path(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore { blobs: Arc<DashMap<String, String>> }

impl MemoryKvStore {
    pub fn new() -> Self { Self::default() }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> { Ok(self.blobs.get(key).map(|v| v.value().clone())) }
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> { self.blobs.insert(key.to_string(), value.to_string()); Ok(()) }
    fn remove(&self, key: &str) -> Result<(), SessionError> { self.blobs.remove(key); Ok(()) }
}

/// Read and decode a blob, falling back to `T::default()` when it is missing or unusable.
pub fn load_or_default<T: DeserializeOwned + Default>(kv: &dyn KvStore, key: &str) -> T {
    load(kv, key).unwrap_or_default()
}

/// Read and decode a blob. Unusable data is logged and reported as absent.
pub fn load<T: DeserializeOwned>(kv: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read session state, starting empty");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupt session state, starting empty");
            None
        }
    }
}

pub fn save<T: Serialize + ?Sized>(kv: &dyn KvStore, key: &str, value: &T) -> Result<(), SessionError> {
    kv.set(key, &serde_json::to_string(value)?)
}

/// Save, logging instead of failing. Session writes never block the action that caused them.
pub(crate) fn persist<T: Serialize + ?Sized>(kv: &dyn KvStore, key: &str, value: &T) {
    if let Err(e) = save(kv, key, value) {
        tracing::warn!(key, error = %e, "failed to persist session state");
    }
}
