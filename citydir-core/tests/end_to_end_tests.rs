/*!
End-to-end tests: snapshot file on disk → store → service → snapshot file.
*/

use citydir_core::{
    create_store_from_config, City, CityQuery, DirectoryConfig, DirectoryError, DirectoryService,
    LocalFileStorage, RecordStore,
};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> Arc<RecordStore<LocalFileStorage>> {
    Arc::new(RecordStore::new(
        LocalFileStorage::with_base_dir(dir.path()),
        "cities.csv",
    ))
}

#[test]
fn test_process_lifecycle_roundtrip() {
    let temp_dir = TempDir::new().unwrap();

    // First process: nothing on disk yet.
    let store = store_in(&temp_dir);
    assert_eq!(store.load().unwrap(), 0);

    let service = DirectoryService::new(Arc::clone(&store));
    service
        .add(City::new(1, "Abakan", "Khakassia", "Siberian", 165_183, 1931))
        .unwrap();
    service
        .add(City::new(2, "Kyzyl", "Tuva", "Siberian", 109_918, 1914))
        .unwrap();
    service
        .add(City::new(3, "Yakutsk", "Sakha", "Far Eastern", 269_601, 1632))
        .unwrap();
    service.delete_by_id(2);
    service.update_population(3, 270_000).unwrap();
    store.save().unwrap();

    // Second process: sees exactly what the first one saved.
    let restarted = store_in(&temp_dir);
    assert_eq!(restarted.load().unwrap(), 2);
    let service = DirectoryService::new(restarted);

    let all = service.get_all();
    assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(service.get_by_id(3).unwrap().population, 270_000);
    assert!(matches!(
        service.get_by_id(2).unwrap_err(),
        DirectoryError::NotFound(2)
    ));
}

#[test]
fn test_snapshot_file_layout() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);
    let service = DirectoryService::new(Arc::clone(&store));

    service
        .add(City::new(10, "Petropavlovsk-Kamchatsky", "Kamchatka Krai", "Far Eastern", 179_526, 1740))
        .unwrap();
    service
        .add(City::new(11, "Nizhny Novgorod, old town", "Nizhny Novgorod Oblast", "Volga", 1_250_619, 1221))
        .unwrap();
    store.save().unwrap();

    let text = fs::read_to_string(temp_dir.path().join("cities.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "10,Petropavlovsk-Kamchatsky,Kamchatka Krai,Far Eastern,179526,1740",
            "11,\"Nizhny Novgorod, old town\",Nizhny Novgorod Oblast,Volga,1250619,1221",
        ]
    );
}

#[test]
fn test_hand_written_snapshot_is_queryable() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("cities.csv"),
        "1,Barnaul,Altai Krai,Siberian,632372,1730\n\
         2,Biysk,Altai Krai,Siberian,203826,1709\n\
         3,Rubtsovsk,Altai Krai,Siberian,147002,1892\n\
         4,Tver,Tver Oblast,Central,403726,1135\n",
    )
    .unwrap();

    let store = store_in(&temp_dir);
    assert_eq!(store.load().unwrap(), 4);
    let service = DirectoryService::new(store);

    let query = CityQuery::new()
        .region("Altai Krai")
        .population("147002-632372")
        .foundation("1700-1800");
    let ids: Vec<i64> = service.list(&query).unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let err = service
        .list(&CityQuery::new().population("lots"))
        .unwrap_err();
    assert!(matches!(err, DirectoryError::MalformedRange(_)));
}

#[test]
fn test_malformed_snapshot_fails_load() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("cities.csv"),
        "1,Barnaul,Altai Krai,Siberian,632372,1730\n2,Biysk,Altai Krai\n",
    )
    .unwrap();

    let store = store_in(&temp_dir);
    let err = store.load().unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidFormat(_)));
    assert!(store.is_empty());
}

#[test]
fn test_empty_snapshot_file_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("cities.csv"), "").unwrap();

    let store = store_in(&temp_dir);
    assert_eq!(store.load().unwrap(), 0);
}

#[test]
fn test_store_from_config_uses_snapshot_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("cities.csv");
    let config = DirectoryConfig::with_snapshot_path(&path);

    let store = create_store_from_config(&config).unwrap();
    store
        .records_mut()
        .push(City::new(1, "Sochi", "Krasnodar Krai", "Southern", 466_078, 1838));
    store.save().unwrap();

    assert!(path.exists());
}

#[test]
fn test_concurrent_readers_and_writers() {
    let temp_dir = TempDir::new().unwrap();
    let store = store_in(&temp_dir);
    let service = DirectoryService::new(Arc::clone(&store));

    let writers: Vec<_> = (0..8)
        .map(|w| {
            let service = service.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let id = w * 1000 + i;
                    service
                        .add(City::new(id, format!("c{id}"), "R", "D", i, i))
                        .unwrap();
                    if i % 2 == 0 {
                        service.update_population(id, i + 1).unwrap();
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let listed = service.list(&CityQuery::new().region("R")).unwrap();
                    let mut ids: Vec<i64> = listed.iter().map(|c| c.id).collect();
                    let len = ids.len();
                    ids.sort_unstable();
                    ids.dedup();
                    assert_eq!(ids.len(), len);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(service.get_all().len(), 400);
    store.save().unwrap();

    let reloaded = store_in(&temp_dir);
    assert_eq!(reloaded.load().unwrap(), 400);
}
