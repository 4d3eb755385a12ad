/*!
Record store: the canonical, ordered, in-memory city collection.

The collection sits behind one `RwLock`. Readers share it; every mutation takes
the exclusive guard, so a lookup-then-write sequence performed under a single
write guard is atomic with respect to concurrent requests.
*/

use crate::city::City;
use crate::snapshot::{SnapshotEngine, SnapshotStats};
use crate::storage::StorageAdapter;
use crate::Result;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Owner of the city collection and of the snapshot it is persisted to
#[derive(Debug)]
pub struct RecordStore<S>
where
    S: StorageAdapter,
{
    records: RwLock<Vec<City>>,
    engine: SnapshotEngine<S>,
    snapshot_path: String,
}

impl<S> RecordStore<S>
where
    S: StorageAdapter,
{
    /// Create an empty store persisted to `snapshot_path` through `storage`
    pub fn new(storage: S, snapshot_path: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            engine: SnapshotEngine::new(storage),
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Snapshot location this store loads from and saves to
    pub fn snapshot_path(&self) -> &str {
        &self.snapshot_path
    }

    /// The snapshot engine backing this store
    pub fn engine(&self) -> &SnapshotEngine<S> {
        &self.engine
    }

    /// Replace the collection with the contents of the snapshot
    ///
    /// A missing or empty snapshot leaves the store empty. On error the current
    /// collection is left untouched.
    ///
    /// # Returns
    /// The number of records loaded
    pub fn load(&self) -> Result<usize> {
        let cities = self.engine.load_snapshot(&self.snapshot_path)?;
        let count = cities.len();
        *self.records.write() = cities;

        #[cfg(feature = "metrics")]
        crate::observability::DirectoryMetrics::global().set_record_count(count);

        Ok(count)
    }

    /// Write the current collection to the snapshot, overwriting it
    pub fn save(&self) -> Result<SnapshotStats> {
        let records = self.records.read();
        self.engine.save_snapshot(&records, &self.snapshot_path)
    }

    /// Shared access to the live collection
    pub fn records(&self) -> RwLockReadGuard<'_, Vec<City>> {
        self.records.read()
    }

    /// Exclusive access to the live collection
    pub fn records_mut(&self) -> RwLockWriteGuard<'_, Vec<City>> {
        self.records.write()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::DirectoryError;

    const PATH: &str = "cities.csv";

    #[test]
    fn test_load_missing_snapshot_gives_empty_store() {
        let store = RecordStore::new(MemoryStorage::new(), PATH);
        assert_eq!(store.load().unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let storage = MemoryStorage::new();
        let store = RecordStore::new(storage.clone(), PATH);
        store
            .records_mut()
            .push(City::new(1, "Omsk", "Omsk Oblast", "Siberian", 1_125_695, 1716));
        store
            .records_mut()
            .push(City::new(2, "Tara", "Omsk Oblast", "Siberian", 26_664, 1594));

        let stats = store.save().unwrap();
        assert_eq!(stats.records, 2);

        let reloaded = RecordStore::new(storage, PATH);
        assert_eq!(reloaded.load().unwrap(), 2);
        assert_eq!(*reloaded.records(), *store.records());
    }

    #[test]
    fn test_load_replaces_existing_records() {
        let storage = MemoryStorage::with_contents(PATH, "5,Kursk,Kursk Oblast,Central,440052,1032\n");
        let store = RecordStore::new(storage, PATH);
        store
            .records_mut()
            .push(City::new(1, "Omsk", "Omsk Oblast", "Siberian", 1, 1716));

        store.load().unwrap();

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 5);
    }

    #[test]
    fn test_failed_load_keeps_current_records() {
        let storage = MemoryStorage::with_contents(PATH, "not,a,city\n");
        let store = RecordStore::new(storage, PATH);
        store
            .records_mut()
            .push(City::new(1, "Omsk", "Omsk Oblast", "Siberian", 1, 1716));

        let err = store.load().unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidFormat(_)));
        assert_eq!(store.len(), 1);
    }
}
