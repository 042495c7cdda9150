//! Error types for the persistence layer.
//!
//! Errors are grouped by category: resource state, validation (including
//! malformed request parameters and unknown entity types), concurrency, and
//! backend failures. [`StorageError`] wraps all of them so callers can use a
//! single `?`-friendly result type.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::EntityKind;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Concurrency and versioning errors
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns true if this error originates from the storage backend
    /// rather than from the caller's input.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, StorageError::Backend(_))
    }

    /// Returns true for the "no such entity" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Shorthand for [`ValidationError::InvalidParameter`].
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StorageError::Validation(ValidationError::InvalidParameter {
            name: name.into(),
            value: value.into(),
            message: message.into(),
        })
    }

    /// Shorthand for [`ResourceError::NotFound`].
    pub fn not_found(kind: EntityKind, id: u64) -> Self {
        StorageError::Resource(ResourceError::NotFound { kind, id })
    }
}

/// Errors related to entity state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested entity does not exist or has been deleted.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u64 },

    /// An entity with the same identity already exists.
    #[error("{kind} already exists: {message}")]
    AlreadyExists { kind: EntityKind, message: String },
}

/// Errors related to request and entity validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A request parameter is malformed (non-numeric page, zero limit, ...).
    #[error("invalid parameter '{name}' = '{value}': {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    /// No code prefix (or no entity kind at all) is registered for this type.
    #[error("unknown entity type: {entity_type}")]
    UnknownEntityType { entity_type: String },

    /// A required field is missing or blank.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field references an entity that does not exist.
    #[error("invalid reference in '{field}': {message}")]
    InvalidReference { field: String, message: String },

    /// Not enough stock to satisfy a purchase.
    #[error("insufficient stock for book {book_id}: requested {requested}, available {available}")]
    InsufficientStock {
        book_id: u64,
        requested: u32,
        available: u32,
    },

    /// The entity is in a state that does not allow the operation.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// A query targets a different entity kind than the caller expects.
    #[error("query targets {actual}, expected {expected}")]
    KindMismatch {
        expected: EntityKind,
        actual: EntityKind,
    },
}

/// Errors related to concurrency control.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// Version conflict detected during optimistic locking.
    #[error("version conflict on {kind} {id}: expected {expected_version}, found {actual_version}")]
    VersionConflict {
        kind: EntityKind,
        id: u64,
        expected_version: u64,
        actual_version: u64,
    },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StorageError::not_found(EntityKind::Author, 7);
        assert_eq!(err.to_string(), "Author 7 not found");
        assert!(err.is_not_found());
        assert!(!err.is_storage_failure());
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = StorageError::invalid_parameter("page", "abc", "must be a positive integer");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'page' = 'abc': must be a positive integer"
        );
    }

    #[test]
    fn test_unknown_entity_type_display() {
        let err = ValidationError::UnknownEntityType {
            entity_type: "User".to_string(),
        };
        assert_eq!(err.to_string(), "unknown entity type: User");
    }

    #[test]
    fn test_version_conflict_display() {
        let err = ConcurrencyError::VersionConflict {
            kind: EntityKind::Book,
            id: 3,
            expected_version: 1,
            actual_version: 2,
        };
        assert_eq!(
            err.to_string(),
            "version conflict on Book 3: expected 1, found 2"
        );
    }

    #[test]
    fn test_backend_errors_are_storage_failures() {
        let err: StorageError = BackendError::Unavailable {
            backend_name: "sqlite".to_string(),
            message: "disk I/O error".to_string(),
        }
        .into();
        assert!(err.is_storage_failure());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::SerializationError { .. })
        ));
    }
}
