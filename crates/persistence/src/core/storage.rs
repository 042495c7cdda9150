//! Core entity storage trait.
//!
//! This module defines [`EntityStorage`], the create/read/update/delete,
//! count and fetch operations every backend provides for bookstore entities.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::query::EntityQuery;
use crate::types::{EntityKind, EntityRecord, PageWindow};

/// Core storage trait for bookstore entities.
///
/// # Identity
///
/// Ids are allocated per kind, start at 1 and are never reused, including
/// after a soft delete.
///
/// # Versioning
///
/// Every write increments the row's version. `update` takes the version the
/// caller last saw and fails with a version conflict if the row has moved on.
///
/// # Soft Deletes
///
/// `delete` marks the row deleted. Deleted rows are invisible to `read` and
/// to queries in the default scope, but still count for queries built with
/// [`EntityQuery::include_deleted`]. `restore` brings a row back.
///
/// # Ordering
///
/// `fetch` returns rows in ascending id order.
///
/// # Example
///
/// ```ignore
/// use bookstore_persistence::core::EntityStorage;
/// use bookstore_persistence::query::EntityQuery;
/// use bookstore_persistence::types::{EntityKind, PageWindow};
///
/// async fn example<S: EntityStorage>(storage: &S) -> StorageResult<()> {
///     let created = storage
///         .create(EntityKind::Author, None, serde_json::json!({"name": "Le Guin"}))
///         .await?;
///
///     let query = EntityQuery::new(EntityKind::Author);
///     assert_eq!(storage.count(&query).await?, 1);
///
///     let updated = storage
///         .update(EntityKind::Author, created.id(), created.version(), serde_json::json!({"name": "Ursula K. Le Guin"}))
///         .await?;
///     assert_eq!(updated.version(), 2);
///
///     storage.delete(EntityKind::Author, created.id()).await?;
///     assert_eq!(storage.count(&query.include_deleted()).await?, 1);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait EntityStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Inserts a new row and returns it with its allocated id.
    async fn create(
        &self,
        kind: EntityKind,
        code: Option<String>,
        data: Value,
    ) -> StorageResult<EntityRecord>;

    /// Reads an active row. Returns `None` if it does not exist or is
    /// deleted.
    async fn read(&self, kind: EntityKind, id: u64) -> StorageResult<Option<EntityRecord>>;

    /// Replaces the payload of an active row.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` if the row does not exist or is deleted
    /// * `ConcurrencyError::VersionConflict` if `expected_version` is stale
    async fn update(
        &self,
        kind: EntityKind,
        id: u64,
        expected_version: u64,
        data: Value,
    ) -> StorageResult<EntityRecord>;

    /// Soft-deletes an active row.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` if the row does not exist or is already
    ///   deleted
    async fn delete(&self, kind: EntityKind, id: u64) -> StorageResult<()>;

    /// Brings a soft-deleted row back to the active state.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` if no deleted row with this id exists
    async fn restore(&self, kind: EntityKind, id: u64) -> StorageResult<EntityRecord>;

    /// Counts the rows matched by `query`.
    async fn count(&self, query: &EntityQuery) -> StorageResult<u64>;

    /// Fetches the rows matched by `query` inside `window`, ordered by id.
    async fn fetch(
        &self,
        query: &EntityQuery,
        window: PageWindow,
    ) -> StorageResult<Vec<EntityRecord>>;

    /// Fetches every row matched by `query`.
    async fn fetch_all(&self, query: &EntityQuery) -> StorageResult<Vec<EntityRecord>> {
        self.fetch(query, PageWindow::all()).await
    }
}
