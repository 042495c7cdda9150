//! Backend abstraction for database drivers.
//!
//! This module defines the [`Backend`] trait: lifecycle and capability
//! discovery for a database driver, separate from the entity operations in
//! [`EntityStorage`](super::EntityStorage).

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Capabilities that a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// Basic create/read/update/delete.
    Crud,
    /// Soft delete with restore.
    SoftDelete,
    /// Offset-based pagination.
    OffsetPagination,
    /// Case-insensitive substring search on payload fields.
    SubstringSearch,
    /// Atomic multi-entity write batches.
    Transactions,
    /// Version checks on update and delete.
    OptimisticLocking,
}

impl std::fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendCapability::Crud => "crud",
            BackendCapability::SoftDelete => "soft-delete",
            BackendCapability::OffsetPagination => "offset-pagination",
            BackendCapability::SubstringSearch => "substring-search",
            BackendCapability::Transactions => "transactions",
            BackendCapability::OptimisticLocking => "optimistic-locking",
        };
        write!(f, "{}", name)
    }
}

/// A database backend.
///
/// # Example
///
/// ```ignore
/// use bookstore_persistence::core::{Backend, BackendCapability};
///
/// if !backend.supports(BackendCapability::Transactions) {
///     // Fall back to sequential writes
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if this backend supports the given capability.
    fn supports(&self, capability: BackendCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Returns all capabilities supported by this backend.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Checks if the backend is healthy and accepting connections.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Creates the schema if it does not exist yet.
    async fn initialize(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn test_backend_capability_display() {
        assert_eq!(BackendCapability::Crud.to_string(), "crud");
        assert_eq!(
            BackendCapability::SubstringSearch.to_string(),
            "substring-search"
        );
        assert_eq!(
            BackendCapability::OptimisticLocking.to_string(),
            "optimistic-locking"
        );
    }
}
