/*!
Offline snapshot inspection commands.
*/

use citydir_core::{
    create_store_from_config, City, CityId, CityQuery, DirectoryConfig, DirectoryService,
};
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::{error, info};

#[derive(Tabled)]
struct CityRow {
    #[tabled(rename = "ID")]
    id: CityId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "District")]
    district: String,
    #[tabled(rename = "Population")]
    population: i64,
    #[tabled(rename = "Founded")]
    foundation: i64,
}

impl From<City> for CityRow {
    fn from(city: City) -> Self {
        Self {
            id: city.id,
            name: city.name,
            region: city.region,
            district: city.district,
            population: city.population,
            foundation: city.foundation,
        }
    }
}

fn open_directory(
    config: &DirectoryConfig,
) -> anyhow::Result<DirectoryService<citydir_core::LocalFileStorage>> {
    let store = create_store_from_config(config)?;
    store.load()?;
    Ok(DirectoryService::new(Arc::new(store)))
}

/// Print the snapshot records matching `query` as a table
pub fn list_cities(config: &DirectoryConfig, query: &CityQuery) -> anyhow::Result<()> {
    info!(snapshot = %config.snapshot_path.display(), ?query, "listing cities");

    let directory = open_directory(config)?;
    let cities = directory.list(query)?;

    if cities.is_empty() {
        println!("No cities found");
    } else {
        let rows: Vec<CityRow> = cities.into_iter().map(CityRow::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}

/// Print one snapshot record
pub fn show_city(config: &DirectoryConfig, id: CityId) -> anyhow::Result<()> {
    let directory = open_directory(config)?;
    let city = directory.get_by_id(id)?;

    println!("City Details:");
    println!("  ID: {}", city.id);
    println!("  Name: {}", city.name);
    println!("  Region: {}", city.region);
    println!("  District: {}", city.district);
    println!("  Population: {}", city.population);
    println!("  Founded: {}", city.foundation);
    Ok(())
}

/// Check that the snapshot decodes and report how many records it holds
pub fn verify_snapshot(config: &DirectoryConfig) -> anyhow::Result<()> {
    let store = create_store_from_config(config)?;
    let path = store.snapshot_path().to_string();

    if !store.engine().snapshot_exists(&path) {
        println!("No snapshot at {path}; the server will start empty");
        return Ok(());
    }

    match store.engine().verify_snapshot(&path) {
        Ok(count) => {
            println!("✓ Snapshot {path} is valid ({count} cities)");
            Ok(())
        }
        Err(e) => {
            error!("✗ Snapshot {} failed to load: {}", path, e);
            Err(e.into())
        }
    }
}
