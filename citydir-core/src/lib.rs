/*!
# City Directory Core

In-memory directory of city records with durable CSV snapshots.

- `RecordStore` owns the ordered collection behind a single read/write lock
- `SnapshotEngine` loads and saves the collection through a `StorageAdapter`
- `DirectoryService` enforces id uniqueness and performs lookups and updates
- `CityQuery` narrows list results with region, district and range predicates

## Usage

```rust
use std::sync::Arc;
use citydir_core::{City, CityQuery, DirectoryService, RecordStore, LocalFileStorage};

let dir = tempfile::tempdir()?;
let store = Arc::new(RecordStore::new(
    LocalFileStorage::with_base_dir(dir.path()),
    "cities.csv",
));
store.load()?; // missing snapshot: starts empty

let service = DirectoryService::new(Arc::clone(&store));
service.add(City::new(1, "Biysk", "Altai Krai", "Siberian", 200_629, 1709))?;
service.update_population(1, 201_000)?;

let siberian = service.list(&CityQuery::new().district("Siberian").population("0-500000"))?;
assert_eq!(siberian.len(), 1);

store.save()?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub mod city;
pub mod config;
pub mod directory;
pub mod error;
pub mod observability;
pub mod query;
pub mod snapshot;
pub mod storage;
pub mod store;

mod error_tests;

pub use city::{City, CityId};
pub use config::{create_store_from_config, DirectoryConfig};
pub use directory::{CityDirectory, DirectoryService};
pub use error::{DirectoryError, Result};
pub use query::{CityFilter, CityQuery, Range};
pub use snapshot::{SnapshotEngine, SnapshotStats};
pub use storage::{LocalFileStorage, MemoryStorage, StorageAdapter};
pub use store::RecordStore;
