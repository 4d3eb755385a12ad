/*!
Storage adapters for snapshot persistence.

The snapshot engine only sees the `StorageAdapter` port: raw bytes in, raw bytes
out. Where those bytes live is decided by the adapter, so the record store can be
exercised against memory in tests and against the filesystem in production.
*/

pub mod local;

use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub use local::LocalFileStorage;

/// Storage abstraction for saving and loading snapshot bytes
pub trait StorageAdapter: Send + Sync {
    /// Save snapshot data to the specified location, replacing any previous contents
    ///
    /// # Arguments
    /// * `data` - The encoded snapshot
    /// * `path` - The storage location (interpretation depends on implementation)
    fn save(&self, data: &[u8], path: &str) -> Result<()>;

    /// Load snapshot data from the specified location
    ///
    /// # Returns
    /// `Ok(None)` when nothing has been stored at `path` yet; the caller decides
    /// whether absence is an error.
    fn load(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Check if a snapshot exists at the specified location
    fn exists(&self, path: &str) -> bool;
}

/// Memory-based storage adapter
///
/// Keeps snapshots in a shared map. Clones share the same map, which lets a test
/// hand one clone to a store and inspect the bytes through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the adapter with raw contents at `path`.
    pub fn with_contents(path: &str, data: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage.data.lock().insert(path.to_string(), data.into());
        storage
    }

    /// Raw bytes currently stored at `path`.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.data.lock().get(path).cloned()
    }
}

impl StorageAdapter for MemoryStorage {
    fn save(&self, data: &[u8], path: &str) -> Result<()> {
        self.data.lock().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().get(path).cloned())
    }

    fn exists(&self, path: &str) -> bool {
        self.data.lock().contains_key(path)
    }
}
