//! Local (guest) cart persistence.
//!
//! The guest cart lives under a single key as a JSON array of lines - the
//! browser-local-storage shape. [`JsonFileStore`] maps that key to one JSON
//! file on disk; [`MemoryStore`] keeps it in memory for tests and embedded
//! use.
//!
//! Exactly one engine instance should own a given storage path. Concurrent
//! writers (a second process or "tab") are not coordinated; the last write
//! wins. This is an accepted limitation, not an oversight.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use axle_core::CartLine;

use crate::error::CartSyncError;

/// Key-value persistence for the guest cart.
///
/// `load` returns `Ok(None)` when nothing has ever been saved. A `Parse`
/// error from `load` means the persisted value is corrupt; callers treat
/// that as an empty cart.
pub trait LocalStore: Send + Sync {
    /// Read the persisted cart, if any.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on I/O failure and `Parse` on corrupt data.
    fn load(&self) -> Result<Option<Vec<CartLine>>, CartSyncError>;

    /// Replace the persisted cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on I/O failure.
    fn save(&self, lines: &[CartLine]) -> Result<(), CartSyncError>;

    /// Erase the persisted cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on I/O failure.
    fn clear(&self) -> Result<(), CartSyncError>;
}

/// [`LocalStore`] backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store persisting to the given path.
    ///
    /// The file and its parent directories are created lazily on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this store persists to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl LocalStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<CartLine>>, CartSyncError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let lines = serde_json::from_str(&raw)?;
        Ok(Some(lines))
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), CartSyncError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash mid-write cannot leave a torn file.
        let tmp = self.path.with_extension("json.tmp");
        let raw = serde_json::to_string(lines)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CartSyncError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory [`LocalStore`].
///
/// Used by tests and by embedders that want engine semantics without disk
/// persistence. Tracks how many saves have landed, which lets tests observe
/// debounce coalescing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<Vec<CartLine>>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves that have landed.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<CartLine>>, CartSyncError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), CartSyncError> {
        *self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(lines.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), CartSyncError> {
        *self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn sample_lines() -> Vec<CartLine> {
        vec![
            CartLine::new("brake-pad", "Brake Pad Set", Decimal::new(4999, 2), 2),
            CartLine::new("oil-filter", "Oil Filter", Decimal::new(1250, 2), 1),
        ]
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("cart.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&sample_lines()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, sample_lines());
    }

    #[test]
    fn test_file_store_corrupt_data_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(CartSyncError::Parse(_))));
    }

    #[test]
    fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let store = JsonFileStore::new(path.clone());

        store.save(&sample_lines()).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.load().unwrap().is_none());

        // Clearing an already-empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deep/cart.json"));
        store.save(&sample_lines()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        store.save(&sample_lines()).unwrap();
        store.save(&[]).unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().unwrap(), Some(Vec::new()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
