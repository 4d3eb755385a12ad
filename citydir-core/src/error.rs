/*!
Error types for the city directory core.
*/

use crate::city::CityId;
use thiserror::Error;

/// Result type used throughout the directory core.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Errors that can occur while querying, mutating or persisting the directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// No record carries the requested id
    #[error("city {0} not found")]
    NotFound(CityId),

    /// A record with the same id is already stored
    #[error("city with id {0} already exists")]
    AlreadyExists(CityId),

    /// A range criterion is not of the form `<int>-<int>`
    #[error("Malformed range: {0}")]
    MalformedRange(String),

    /// A caller-supplied field value cannot be applied
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// CSV encoding/decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid snapshot contents
    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),

    /// Storage adapter errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DirectoryError {
    /// Create a new malformed range error
    pub fn malformed_range<S: Into<String>>(msg: S) -> Self {
        Self::MalformedRange(msg.into())
    }

    /// Create a new invalid field error
    pub fn invalid_field<S: Into<String>>(msg: S) -> Self {
        Self::InvalidField(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new invalid format error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::AlreadyExists(_)
                | Self::MalformedRange(_)
                | Self::InvalidField(_)
        )
    }
}
