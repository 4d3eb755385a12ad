/*!
Snapshot persistence for the city collection.

A snapshot is a headerless CSV file, one city per line, columns in the order
`id,name,region,district,population,foundation`. The engine encodes and decodes
that format and delegates the bytes to a `StorageAdapter`.
*/

use crate::city::{City, CityId};
use crate::storage::StorageAdapter;
use crate::{DirectoryError, Result};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// Number of columns in one snapshot line.
pub const SNAPSHOT_FIELD_COUNT: usize = 6;

/// Summary of a completed save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStats {
    /// Records written
    pub records: usize,
    /// Encoded size in bytes
    pub bytes: usize,
}

/// Engine that reads and writes city snapshots through a storage adapter
///
/// # Example
/// ```rust
/// use citydir_core::{City, SnapshotEngine, storage::MemoryStorage};
///
/// let engine = SnapshotEngine::new(MemoryStorage::new());
/// let cities = vec![City::new(1, "Omsk", "Omsk Oblast", "Siberian", 1_125_695, 1716)];
///
/// engine.save_snapshot(&cities, "cities.csv")?;
/// assert_eq!(engine.load_snapshot("cities.csv")?, cities);
/// # Ok::<(), citydir_core::DirectoryError>(())
/// ```
#[derive(Debug)]
pub struct SnapshotEngine<S>
where
    S: StorageAdapter,
{
    storage: S,
}

impl<S> SnapshotEngine<S>
where
    S: StorageAdapter,
{
    /// Create a new snapshot engine over the given storage adapter
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Access the underlying storage adapter
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Encode `cities` and store them at `path`, replacing the previous snapshot
    ///
    /// # Errors
    /// * `DirectoryError::Csv` - If a record cannot be encoded
    /// * `DirectoryError::Storage` - If the storage adapter fails
    pub fn save_snapshot(&self, cities: &[City], path: &str) -> Result<SnapshotStats> {
        let started = Instant::now();

        let data = encode_cities(cities)?;
        self.storage.save(&data, path)?;

        let stats = SnapshotStats {
            records: cities.len(),
            bytes: data.len(),
        };

        #[cfg(feature = "metrics")]
        crate::observability::DirectoryMetrics::global()
            .record_snapshot("save", started.elapsed());

        info!(
            path,
            records = stats.records,
            bytes = stats.bytes,
            duration_ms = started.elapsed().as_millis() as u64,
            "snapshot saved"
        );
        Ok(stats)
    }

    /// Load the snapshot stored at `path`
    ///
    /// A missing or empty snapshot yields an empty collection.
    ///
    /// # Errors
    /// * `DirectoryError::InvalidFormat` - If a line is malformed or an id repeats
    /// * `DirectoryError::Storage` - If the storage adapter fails
    pub fn load_snapshot(&self, path: &str) -> Result<Vec<City>> {
        let started = Instant::now();

        let cities = match self.storage.load(path)? {
            Some(data) => decode_cities(&data)?,
            None => {
                debug!(path, "no snapshot found, starting empty");
                Vec::new()
            }
        };

        #[cfg(feature = "metrics")]
        crate::observability::DirectoryMetrics::global()
            .record_snapshot("load", started.elapsed());

        info!(
            path,
            records = cities.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "snapshot loaded"
        );
        Ok(cities)
    }

    /// Check if a snapshot exists at the specified path
    pub fn snapshot_exists(&self, path: &str) -> bool {
        self.storage.exists(path)
    }

    /// Decode the snapshot at `path` without keeping the records
    ///
    /// Returns the number of records it holds.
    pub fn verify_snapshot(&self, path: &str) -> Result<usize> {
        Ok(self.load_snapshot(path)?.len())
    }
}

/// Encode cities as headerless CSV in snapshot column order
pub fn encode_cities(cities: &[City]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for city in cities {
        writer.serialize(city)?;
    }

    writer
        .into_inner()
        .map_err(|e| DirectoryError::storage(format!("Failed to flush snapshot buffer: {e}")))
}

/// Decode headerless CSV snapshot bytes
///
/// Blank lines are ignored. Fields are taken verbatim, surrounding whitespace
/// included. Every other line must hold exactly
/// `SNAPSHOT_FIELD_COUNT` fields with integer id, population and foundation,
/// and ids must be unique across the file.
pub fn decode_cities(data: &[u8]) -> Result<Vec<City>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut cities = Vec::new();
    let mut seen: HashSet<CityId> = HashSet::new();

    for record in reader.records() {
        let record = record.map_err(|e| {
            DirectoryError::invalid_format(format!("line {}: {e}", line_of(e.position())))
        })?;
        let line = line_of(record.position());

        if record.len() != SNAPSHOT_FIELD_COUNT {
            return Err(DirectoryError::invalid_format(format!(
                "line {line}: expected {SNAPSHOT_FIELD_COUNT} fields, found {}",
                record.len()
            )));
        }

        let city: City = record
            .deserialize(None)
            .map_err(|e| DirectoryError::invalid_format(format!("line {line}: {e}")))?;

        if !seen.insert(city.id) {
            return Err(DirectoryError::invalid_format(format!(
                "line {line}: duplicate city id {}",
                city.id
            )));
        }
        cities.push(city);
    }

    Ok(cities)
}

fn line_of(position: Option<&csv::Position>) -> u64 {
    position.map(|p| p.line()).unwrap_or(0)
}
