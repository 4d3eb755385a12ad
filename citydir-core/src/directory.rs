/*!
Directory service: CRUD operations over the record store.

The service enforces the entity invariants the store itself does not know
about: ids are unique, lookups are by id, and only `population` changes after a
record is created. Each operation takes the store lock exactly once, so a
check-then-write (collision check before append, lookup before update) cannot
interleave with another request.
*/

use crate::city::{City, CityId};
use crate::query::CityQuery;
use crate::storage::StorageAdapter;
use crate::store::RecordStore;
use crate::{DirectoryError, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "metrics")]
use crate::observability::DirectoryMetrics;

/// Use-case service for city records
///
/// # Example
/// ```rust
/// use citydir_core::{City, CityQuery, DirectoryService};
///
/// let service = DirectoryService::in_memory();
/// service.add(City::new(1, "Omsk", "Omsk Oblast", "Siberian", 1_125_695, 1716))?;
///
/// let found = service.list(&CityQuery::new().region("Omsk Oblast"))?;
/// assert_eq!(found.len(), 1);
/// # Ok::<(), citydir_core::DirectoryError>(())
/// ```
#[derive(Debug)]
pub struct DirectoryService<S>
where
    S: StorageAdapter,
{
    store: Arc<RecordStore<S>>,
}

impl<S> Clone for DirectoryService<S>
where
    S: StorageAdapter,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> DirectoryService<S>
where
    S: StorageAdapter,
{
    /// Create a service over a shared record store
    pub fn new(store: Arc<RecordStore<S>>) -> Self {
        Self { store }
    }

    /// The record store this service operates on
    pub fn store(&self) -> &Arc<RecordStore<S>> {
        &self.store
    }

    /// All records in store order
    pub fn get_all(&self) -> Vec<City> {
        record_op("get_all");
        self.store.records().clone()
    }

    /// Records matching `query`, in store order
    ///
    /// # Errors
    /// * `DirectoryError::MalformedRange` - If a range criterion is malformed
    pub fn list(&self, query: &CityQuery) -> Result<Vec<City>> {
        record_op("list");
        let records = self.store.records();
        let result = query.apply(&records).map_err(|e| {
            record_err("list");
            e
        })?;
        debug!(
            total = records.len(),
            matched = result.len(),
            ?query,
            "listed cities"
        );
        Ok(result)
    }

    /// The record with `id`
    ///
    /// # Errors
    /// * `DirectoryError::NotFound` - If no record has this id
    pub fn get_by_id(&self, id: CityId) -> Result<City> {
        record_op("get");
        self.store
            .records()
            .iter()
            .find(|city| city.id == id)
            .cloned()
            .ok_or_else(|| {
                record_err("get");
                DirectoryError::NotFound(id)
            })
    }

    /// Append `city` to the end of the collection
    ///
    /// Only id uniqueness is checked; every other field is stored as given.
    ///
    /// # Errors
    /// * `DirectoryError::AlreadyExists` - If a record with the same id is present
    pub fn add(&self, city: City) -> Result<City> {
        record_op("add");
        let mut records = self.store.records_mut();

        if records.iter().any(|existing| existing.id == city.id) {
            record_err("add");
            return Err(DirectoryError::AlreadyExists(city.id));
        }

        records.push(city.clone());
        record_count(records.len());
        info!(id = city.id, name = %city.name, "city added");
        Ok(city)
    }

    /// Remove the record with `id`, keeping the order of the others
    ///
    /// Removing a missing id is a no-op, not an error.
    ///
    /// # Returns
    /// Whether a record was removed
    pub fn delete_by_id(&self, id: CityId) -> bool {
        record_op("delete");
        let mut records = self.store.records_mut();

        match records.iter().position(|city| city.id == id) {
            Some(index) => {
                records.remove(index);
                record_count(records.len());
                info!(id, "city deleted");
                true
            }
            None => {
                debug!(id, "delete of missing city ignored");
                false
            }
        }
    }

    /// Set the population of the record with `id`
    ///
    /// # Returns
    /// The updated record
    ///
    /// # Errors
    /// * `DirectoryError::NotFound` - If no record has this id
    pub fn update_population(&self, id: CityId, population: i64) -> Result<City> {
        record_op("update_population");
        let mut records = self.store.records_mut();

        let city = records
            .iter_mut()
            .find(|city| city.id == id)
            .ok_or_else(|| {
                record_err("update_population");
                DirectoryError::NotFound(id)
            })?;

        city.update_population(population);
        info!(id, population, "population updated");
        Ok(city.clone())
    }
}

impl DirectoryService<crate::storage::MemoryStorage> {
    /// Service over an empty store backed by memory storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(RecordStore::new(
            crate::storage::MemoryStorage::new(),
            "cities.csv",
        )))
    }
}

/// Operations the transport layer needs from the directory
///
/// Lets request handlers be written against `dyn CityDirectory` regardless of
/// which storage adapter backs the store.
pub trait CityDirectory: Send + Sync {
    fn list(&self, query: &CityQuery) -> Result<Vec<City>>;
    fn get(&self, id: CityId) -> Result<City>;
    fn create(&self, city: City) -> Result<City>;
    fn delete(&self, id: CityId) -> bool;
    fn update_population(&self, id: CityId, population: i64) -> Result<City>;
}

impl<S> CityDirectory for DirectoryService<S>
where
    S: StorageAdapter,
{
    fn list(&self, query: &CityQuery) -> Result<Vec<City>> {
        DirectoryService::list(self, query)
    }

    fn get(&self, id: CityId) -> Result<City> {
        self.get_by_id(id)
    }

    fn create(&self, city: City) -> Result<City> {
        self.add(city)
    }

    fn delete(&self, id: CityId) -> bool {
        self.delete_by_id(id)
    }

    fn update_population(&self, id: CityId, population: i64) -> Result<City> {
        DirectoryService::update_population(self, id, population)
    }
}

#[cfg(feature = "metrics")]
fn record_op(operation: &str) {
    DirectoryMetrics::global().record_request(operation);
}

#[cfg(not(feature = "metrics"))]
fn record_op(_operation: &str) {}

#[cfg(feature = "metrics")]
fn record_err(operation: &str) {
    DirectoryMetrics::global().record_error(operation);
}

#[cfg(not(feature = "metrics"))]
fn record_err(_operation: &str) {}

#[cfg(feature = "metrics")]
fn record_count(count: usize) {
    DirectoryMetrics::global().set_record_count(count);
}

#[cfg(not(feature = "metrics"))]
fn record_count(_count: usize) {}
