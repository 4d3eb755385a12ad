/*!
Tests for directory error types and their messages.
*/

#[cfg(test)]
mod tests {
    use crate::error::DirectoryError;
    use std::io;

    #[test]
    fn test_directory_error_display() {
        let error = DirectoryError::NotFound(7);
        assert_eq!(error.to_string(), "city 7 not found");

        let error = DirectoryError::AlreadyExists(1);
        assert_eq!(error.to_string(), "city with id 1 already exists");

        let error = DirectoryError::malformed_range("expected lo-hi");
        assert_eq!(error.to_string(), "Malformed range: expected lo-hi");

        let error = DirectoryError::invalid_field("population should be a number");
        assert_eq!(
            error.to_string(),
            "Invalid field: population should be a number"
        );

        let error = DirectoryError::storage("disk full");
        assert_eq!(error.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_directory_error_from_csv_error() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let csv_error = csv::Error::from(io_error);
        let error = DirectoryError::from(csv_error);

        match error {
            DirectoryError::Csv(_) => {}
            _ => panic!("Expected Csv error variant"),
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(DirectoryError::NotFound(1).is_client_error());
        assert!(DirectoryError::AlreadyExists(1).is_client_error());
        assert!(DirectoryError::malformed_range("x").is_client_error());
        assert!(DirectoryError::invalid_field("x").is_client_error());

        assert!(!DirectoryError::storage("x").is_client_error());
        assert!(!DirectoryError::invalid_format("x").is_client_error());
        assert!(!DirectoryError::validation("x").is_client_error());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<DirectoryError>();
        assert_sync::<DirectoryError>();
    }
}
