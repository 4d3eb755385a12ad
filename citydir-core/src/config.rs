//! Configuration for the directory service
//!
//! Holds where the snapshot lives and how the HTTP adapter listens and shuts
//! down. The command-line front end fills it from flags and environment
//! variables; `validate` is called before anything is loaded or bound.

use crate::storage::LocalFileStorage;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default snapshot file name
pub const DEFAULT_SNAPSHOT_PATH: &str = "cities.csv";

/// Default listen address of the HTTP adapter
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default per-request timeout and shutdown grace period, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Snapshot file loaded on start and written on stop
    pub snapshot_path: PathBuf,
    /// Socket address the HTTP adapter binds to
    pub listen_addr: String,
    /// Upper bound on handling a single request
    pub request_timeout_secs: u64,
    /// Upper bound on draining in-flight requests after a stop signal
    pub shutdown_grace_secs: u64,
}

impl DirectoryConfig {
    /// Configuration with a custom snapshot path and defaults elsewhere
    pub fn with_snapshot_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            snapshot_path: path.into(),
            ..Self::default()
        }
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            crate::DirectoryError::validation(format!(
                "Invalid listen address `{}`: {e}",
                self.listen_addr
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(crate::DirectoryError::validation(
                "snapshot path must not be empty",
            ));
        }
        self.socket_addr()?;
        if self.request_timeout_secs == 0 {
            return Err(crate::DirectoryError::validation(
                "request timeout must be at least one second",
            ));
        }
        if self.shutdown_grace_secs == 0 {
            return Err(crate::DirectoryError::validation(
                "shutdown grace period must be at least one second",
            ));
        }
        Ok(())
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Create a filesystem-backed record store from configuration
///
/// The configuration is validated first. The store starts empty; call
/// `RecordStore::load` to populate it.
pub fn create_store_from_config(
    config: &DirectoryConfig,
) -> crate::Result<RecordStore<LocalFileStorage>> {
    config.validate()?;
    Ok(RecordStore::new(
        LocalFileStorage::new(),
        config.snapshot_path.to_string_lossy().into_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DirectoryConfig::default();
        assert_eq!(config.snapshot_path, PathBuf::from("cities.csv"));
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_snapshot_path() {
        let config = DirectoryConfig::with_snapshot_path("/var/lib/citydir/cities.csv");
        assert_eq!(
            config.snapshot_path,
            PathBuf::from("/var/lib/citydir/cities.csv")
        );
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn test_validate_rejects_empty_snapshot_path() {
        let config = DirectoryConfig::with_snapshot_path("");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("snapshot path"));
    }

    #[test]
    fn test_validate_rejects_bad_listen_addr() {
        let config = DirectoryConfig {
            listen_addr: "localhost".to_string(),
            ..DirectoryConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid listen address"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = DirectoryConfig {
            request_timeout_secs: 0,
            ..DirectoryConfig::default()
        };
        assert!(config.validate().is_err());

        config.request_timeout_secs = 5;
        config.shutdown_grace_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = DirectoryConfig::with_snapshot_path("data/cities.csv");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DirectoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_create_store_from_config() {
        let store = create_store_from_config(&DirectoryConfig::default()).unwrap();
        assert_eq!(store.snapshot_path(), "cities.csv");
        assert!(store.is_empty());

        let invalid = DirectoryConfig::with_snapshot_path("");
        assert!(create_store_from_config(&invalid).is_err());
    }
}
