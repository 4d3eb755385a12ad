/*!
Local filesystem storage adapter implementation.
*/

use super::StorageAdapter;
use crate::{DirectoryError, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Local filesystem storage adapter
///
/// Snapshots are written to a temporary file in the target directory and then
/// renamed over the target, so readers never observe a half-written snapshot.
/// Missing parent directories are created on save.
///
/// # Example
/// ```rust
/// use citydir_core::storage::{LocalFileStorage, StorageAdapter};
///
/// let dir = tempfile::tempdir()?;
/// let storage = LocalFileStorage::with_base_dir(dir.path());
/// storage.save(b"1,Omsk,Omsk Oblast,Siberian,1125695,1716\n", "cities.csv")?;
/// assert!(storage.exists("cities.csv"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalFileStorage {
    /// Optional base directory for all snapshots
    base_dir: Option<PathBuf>,
}

impl LocalFileStorage {
    /// Create a new local file storage adapter without a base directory
    ///
    /// Paths provided to save/load will be used as-is.
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a new local file storage adapter resolving paths under `base_dir`
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.as_ref().to_path_buf()),
        }
    }

    /// Resolve the full path for a given storage path
    fn resolve_path(&self, path: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        }
    }

    /// Directory the snapshot lives in, created if necessary
    fn ensure_parent_dir(&self, path: &Path) -> Result<PathBuf> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| {
                DirectoryError::storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(parent)
    }
}

impl StorageAdapter for LocalFileStorage {
    fn save(&self, data: &[u8], path: &str) -> Result<()> {
        let full_path = self.resolve_path(path);
        let parent = self.ensure_parent_dir(&full_path)?;

        let write_err = |e: std::io::Error| {
            DirectoryError::storage(format!(
                "Failed to write snapshot to {}: {}",
                full_path.display(),
                e
            ))
        };

        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(data).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&full_path).map_err(|e| write_err(e.error))?;

        Ok(())
    }

    fn load(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.resolve_path(path);

        match fs::read(&full_path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DirectoryError::storage(format!(
                "Failed to read snapshot from {}: {}",
                full_path.display(),
                e
            ))),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_file_storage_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        let data = b"1,Omsk,Omsk Oblast,Siberian,1125695,1716\n";
        storage.save(data, "cities.csv").unwrap();

        assert!(storage.exists("cities.csv"));
        assert_eq!(storage.load("cities.csv").unwrap().unwrap(), data.to_vec());
    }

    #[test]
    fn test_save_overwrites_longer_contents() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        storage
            .save(b"a much longer first snapshot body\n", "cities.csv")
            .unwrap();
        storage.save(b"short\n", "cities.csv").unwrap();

        assert_eq!(
            storage.load("cities.csv").unwrap().unwrap(),
            b"short\n".to_vec()
        );
    }

    #[test]
    fn test_save_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        storage.save(b"x", "data/snapshots/cities.csv").unwrap();
        assert!(temp_dir.path().join("data/snapshots/cities.csv").exists());
    }

    #[test]
    fn test_load_nonexistent_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());

        assert!(storage.load("missing.csv").unwrap().is_none());
        assert!(!storage.exists("missing.csv"));
    }

    #[test]
    fn test_load_directory_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::with_base_dir(temp_dir.path());
        std::fs::create_dir(temp_dir.path().join("dir.csv")).unwrap();

        let err = storage.load("dir.csv").unwrap_err();
        assert!(matches!(err, DirectoryError::Storage(_)));
    }
}
