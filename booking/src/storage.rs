//! Cart persistence.
//!
//! The cart is mirrored to a single key-value slot as one JSON blob, the
//! whole line list every time. [`CartStorage`] wraps a [`KeyValueBackend`]
//! and keeps the forgiving contract the cart relies on: reads never fail
//! (malformed or missing data yields an empty cart) and write failures are
//! logged and swallowed so the in-memory cart stays authoritative for the
//! session.

use crate::types::CartLine;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Storage key holding the serialized cart
pub const CART_KEY: &str = "booking_v1";

/// Errors raised by key-value backends
///
/// These stay internal to the storage layer: [`CartStorage::load`] and
/// [`CartStorage::save`] never surface them to callers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Filesystem error from a file-backed store
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The cart could not be serialized
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key-value substrate for cart persistence
///
/// The browser front end keeps the cart in local storage; this trait is the
/// same string-keyed contract, so backends range from an in-memory map for
/// tests to a file per key on desktop.
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot serve the read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot persist the write.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend
///
/// The default for tests and for sessions that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-per-key backend
///
/// Stores each key as `<dir>/<key>.json`. The desktop analog of browser
/// local storage.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Creates a backend rooted at `dir`
    ///
    /// The directory is created lazily on the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// The persisted cart adapter
///
/// One storage slot ([`CART_KEY`]), all-or-nothing blob writes, and the
/// recovery behavior the cart expects on both ends:
///
/// - [`load`](Self::load) returns the empty cart for missing, unreadable, or
///   malformed data, never an error
/// - [`save`](Self::save) logs and swallows backend failures
pub struct CartStorage {
    backend: std::sync::Arc<dyn KeyValueBackend>,
    key: String,
}

impl CartStorage {
    /// Creates cart storage over the given backend
    #[must_use]
    pub fn new(backend: std::sync::Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            key: CART_KEY.to_string(),
        }
    }

    /// Load the persisted cart lines
    ///
    /// Missing data, a failing backend, and malformed or wrong-shaped JSON
    /// all yield an empty line list. Corrupted storage must never take the
    /// cart down; it degrades to a fresh session.
    #[must_use]
    pub fn load(&self) -> Vec<CartLine> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!(%error, "cart storage read failed, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartLine>>(&raw) {
            Ok(lines) => lines,
            Err(error) => {
                tracing::warn!(%error, "persisted cart is malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the full line list, replacing the previous blob
    ///
    /// Failures are logged and swallowed: the in-memory cart remains
    /// authoritative for the rest of the session.
    pub fn save(&self, lines: &[CartLine]) {
        let payload = match serde_json::to_string(lines) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "failed to serialize cart, keeping memory-only state");
                return;
            }
        };

        if let Err(error) = self.backend.put(&self.key, &payload) {
            tracing::warn!(%error, "cart storage write failed, keeping memory-only state");
        } else {
            tracing::debug!(lines = lines.len(), "cart persisted");
        }
    }
}

impl std::fmt::Debug for CartStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLine, ItemDetails};
    use std::sync::Arc;

    fn storage_with(backend: impl KeyValueBackend + 'static) -> CartStorage {
        CartStorage::new(Arc::new(backend))
    }

    fn sample_lines() -> Vec<CartLine> {
        vec![
            CartLine::new(
                ItemDetails::new("spa", "Forest Spa", 120.0).with_portion("60 min"),
                2,
                false,
            ),
            CartLine::new(ItemDetails::new("r1", "Lakeview Room", 500.0), 3, true),
        ]
    }

    #[test]
    fn load_with_nothing_stored_is_empty() {
        let storage = storage_with(MemoryBackend::new());
        assert!(storage.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let storage = storage_with(MemoryBackend::new());
        let lines = sample_lines();

        storage.save(&lines);
        assert_eq!(storage.load(), lines);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn malformed_blobs_load_as_empty() {
        let backend = Arc::new(MemoryBackend::new());
        let storage = CartStorage::new(Arc::clone(&backend) as Arc<dyn KeyValueBackend>);

        for blob in ["not json", "{}", "[1,2,3]", "null"] {
            backend.put(CART_KEY, blob).unwrap();
            assert!(
                storage.load().is_empty(),
                "blob {blob:?} should load as an empty cart"
            );
        }
    }

    #[test]
    fn save_overwrites_the_previous_blob() {
        let storage = storage_with(MemoryBackend::new());

        storage.save(&sample_lines());
        storage.save(&[]);

        assert!(storage.load().is_empty());
    }

    #[test]
    fn failing_backend_degrades_to_empty() {
        let storage = storage_with(crate::mocks::FailingBackend);

        // Writes are swallowed, reads come back empty
        storage.save(&sample_lines());
        assert!(storage.load().is_empty());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn file_backend_round_trips() {
        let dir = std::env::temp_dir().join(format!("stillwater-cart-{}", uuid::Uuid::new_v4()));
        let storage = storage_with(JsonFileBackend::new(&dir));
        let lines = sample_lines();

        storage.save(&lines);
        assert_eq!(storage.load(), lines);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_backend_missing_file_is_none() {
        let dir = std::env::temp_dir().join(format!("stillwater-cart-{}", uuid::Uuid::new_v4()));
        let backend = JsonFileBackend::new(&dir);

        assert!(matches!(backend.get(CART_KEY), Ok(None)));
    }
}
