//! Stored entity types.
//!
//! This module defines [`StoredEntity`], which wraps an entity payload with
//! persistence metadata such as its per-kind id, generated code, version and
//! timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageResult;

use super::{EntityKind, RowState};

/// An entity payload with persistence metadata.
///
/// The storage layer moves untyped [`EntityRecord`]s (payload as JSON); typed
/// callers convert with [`StoredEntity::into_typed`].
///
/// Serializes as the payload's fields flattened next to `id`, `code`,
/// `version` and the timestamps.
///
/// # Examples
///
/// ```
/// use bookstore_persistence::types::{EntityKind, EntityRecord};
/// use chrono::Utc;
/// use serde_json::json;
///
/// let now = Utc::now();
/// let record = EntityRecord::from_storage(
///     EntityKind::Author,
///     1,
///     Some("AU01".to_string()),
///     1,
///     json!({"name": "Ursula K. Le Guin"}),
///     now,
///     now,
///     None,
/// );
///
/// assert_eq!(record.id(), 1);
/// assert_eq!(record.code(), Some("AU01"));
/// assert!(!record.is_deleted());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct StoredEntity<T = Value> {
    #[serde(skip)]
    kind: EntityKind,

    /// Per-kind identifier, starting at 1.
    id: u64,

    /// Human-readable code such as `BO07`, for kinds that carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,

    /// Version counter, incremented on every write.
    version: u64,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    data: T,
}

/// An untyped stored entity, as moved by the storage traits.
pub type EntityRecord = StoredEntity<Value>;

impl<T> StoredEntity<T> {
    /// Builds a stored entity from values read back from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        kind: EntityKind,
        id: u64,
        code: Option<String>,
        version: u64,
        data: T,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            kind,
            id,
            code,
            version,
            created_at,
            updated_at,
            deleted_at,
            data,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns the soft-delete state of the row.
    pub fn state(&self) -> RowState {
        if self.deleted_at.is_some() {
            RowState::Deleted
        } else {
            RowState::Active
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.state().is_deleted()
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }

    /// Replaces the payload, keeping the metadata.
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> StoredEntity<U> {
        StoredEntity {
            kind: self.kind,
            id: self.id,
            code: self.code,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            data: f(self.data),
        }
    }
}

impl EntityRecord {
    /// Deserializes the JSON payload into a typed entity.
    pub fn into_typed<U: DeserializeOwned>(self) -> StorageResult<StoredEntity<U>> {
        let data = serde_json::from_value(self.data)?;
        Ok(StoredEntity {
            kind: self.kind,
            id: self.id,
            code: self.code,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Named {
        name: String,
    }

    fn record(deleted: bool) -> EntityRecord {
        let now = Utc::now();
        EntityRecord::from_storage(
            EntityKind::Category,
            4,
            Some("CA04".to_string()),
            2,
            json!({"name": "Poetry"}),
            now,
            now,
            deleted.then_some(now),
        )
    }

    #[test]
    fn test_state_follows_deleted_at() {
        assert_eq!(record(false).state(), RowState::Active);
        assert_eq!(record(true).state(), RowState::Deleted);
    }

    #[test]
    fn test_into_typed() {
        let typed: StoredEntity<Named> = record(false).into_typed().unwrap();
        assert_eq!(typed.id(), 4);
        assert_eq!(typed.version(), 2);
        assert_eq!(typed.data().name, "Poetry");
    }

    #[test]
    fn test_into_typed_rejects_wrong_shape() {
        let now = Utc::now();
        let bad = EntityRecord::from_storage(
            EntityKind::Category,
            1,
            None,
            1,
            json!({"title": 3}),
            now,
            now,
            None,
        );
        assert!(bad.into_typed::<Named>().is_err());
    }

    #[test]
    fn test_serializes_flattened() {
        let value = serde_json::to_value(record(false)).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["code"], "CA04");
        assert_eq!(value["name"], "Poetry");
        assert!(value.get("deleted_at").is_none());
    }
}
