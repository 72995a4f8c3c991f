//! Error types for floorgraph-storage

use std::fmt;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Floor absent from the floor directory
    FloorNotFound,
    /// Floor plan version not found
    VersionNotFound,
    /// Point of interest not found
    PoiNotFound,
    /// Routing node not found
    NodeNotFound,
    /// Routing edge not found
    EdgeNotFound,
    /// Publishing record not found
    PublishingNotFound,
    /// (floor_id, version_number) collision
    DuplicateVersion,
    /// Edge endpoint missing, inactive, or owned by another version
    InvalidReference,
    /// Publishing status transition not allowed
    InvalidTransition,
    /// Database errors (SQLite)
    Database,
    /// Serialization/deserialization errors
    Serialization,
    /// I/O errors (artifact bytes)
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FloorNotFound => "floor_not_found",
            ErrorKind::VersionNotFound => "version_not_found",
            ErrorKind::PoiNotFound => "poi_not_found",
            ErrorKind::NodeNotFound => "node_not_found",
            ErrorKind::EdgeNotFound => "edge_not_found",
            ErrorKind::PublishingNotFound => "publishing_not_found",
            ErrorKind::DuplicateVersion => "duplicate_version",
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn floor_not_found(floor_id: i64) -> Self {
        Self::new(
            ErrorKind::FloorNotFound,
            format!("Floor not found: {}", floor_id),
        )
    }

    pub fn version_not_found(version_id: i64) -> Self {
        Self::new(
            ErrorKind::VersionNotFound,
            format!("Version not found: {}", version_id),
        )
    }

    pub fn poi_not_found(poi_id: i64) -> Self {
        Self::new(ErrorKind::PoiNotFound, format!("POI not found: {}", poi_id))
    }

    pub fn node_not_found(node_id: i64) -> Self {
        Self::new(
            ErrorKind::NodeNotFound,
            format!("Routing node not found: {}", node_id),
        )
    }

    pub fn edge_not_found(edge_id: i64) -> Self {
        Self::new(
            ErrorKind::EdgeNotFound,
            format!("Routing edge not found: {}", edge_id),
        )
    }

    pub fn publishing_not_found(publishing_id: i64) -> Self {
        Self::new(
            ErrorKind::PublishingNotFound,
            format!("Publishing record not found: {}", publishing_id),
        )
    }

    pub fn duplicate_version(floor_id: i64, version_number: i32) -> Self {
        Self::new(
            ErrorKind::DuplicateVersion,
            format!(
                "Version {} already exists for floor {}",
                version_number, floor_id
            ),
        )
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidReference, message)
    }

    pub fn invalid_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidTransition,
            format!("Cannot transition publishing status from {} to {}", from, to),
        )
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

// JSON error conversions
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::new(ErrorKind::Io, format!("I/O error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = StorageError::duplicate_version(7, 1);
        let msg = format!("{}", err);
        assert_eq!(msg, "[duplicate_version] Version 1 already exists for floor 7");
    }

    #[test]
    fn test_not_found_constructors() {
        assert_eq!(
            StorageError::floor_not_found(3).kind,
            ErrorKind::FloorNotFound
        );
        assert_eq!(
            StorageError::version_not_found(9).kind,
            ErrorKind::VersionNotFound
        );
        assert_eq!(StorageError::poi_not_found(4).kind, ErrorKind::PoiNotFound);
        assert_eq!(
            StorageError::node_not_found(5).kind,
            ErrorKind::NodeNotFound
        );
        assert_eq!(
            StorageError::edge_not_found(8).kind,
            ErrorKind::EdgeNotFound
        );
        assert_eq!(
            StorageError::publishing_not_found(6).kind,
            ErrorKind::PublishingNotFound
        );
    }

    #[test]
    fn test_invalid_reference() {
        let err = StorageError::invalid_reference("Node 12 belongs to version 3, edge targets version 4");
        assert_eq!(err.kind, ErrorKind::InvalidReference);
        assert!(format!("{}", err).contains("[invalid_reference]"));
    }

    #[test]
    fn test_invalid_transition() {
        let err = StorageError::invalid_transition("draft", "published");
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
        assert!(err.message.contains("draft"));
        assert!(err.message.contains("published"));
    }

    #[test]
    fn test_with_source() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "artifact missing");
        let err = StorageError::database("blob lookup failed").with_source(io_err);

        assert_eq!(err.kind, ErrorKind::Database);
        let source = err.source().unwrap();
        assert!(source.to_string().contains("artifact missing"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json")
            .err()
            .unwrap();
        let err: StorageError = json_err.into();

        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(err.source.is_some());
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(StorageError::version_not_found(42))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::VersionNotFound);
    }
}
