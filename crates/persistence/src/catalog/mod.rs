//! Bookstore operations over any [`AtomicWrites`] storage.
//!
//! [`Catalog`] is the layer a request handler or CLI command talks to. It
//! validates payloads, checks references between entities, assigns codes
//! and groups multi-row writes into atomic batches. Listings go through the
//! [paginator](crate::paginator).
//!
//! # Codes
//!
//! A kind with a registered prefix gets its code from
//! [`AtomicWrites::create_coded`], so the count and the insert cannot
//! interleave with another writer. Kinds without a prefix are stored
//! without a code.
//!
//! # Ownership
//!
//! Purchases, transactions and favorites belong to a user. Asking for one
//! that belongs to somebody else fails with `NotFound`, the same as asking
//! for one that does not exist.

mod authors;
mod books;
mod categories;
mod favorites;
mod purchases;
mod transactions;
mod users;
mod views;

pub use views::{AuthorWithBooks, BookDetails, BookWithAuthor, BooksAndAuthors, FavoriteWithBook};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::codegen::CodeGenerator;
use crate::core::{AtomicWrites, CodeAssignment, WriteOutcome};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::model::{Entity, FavoriteBook, Purchase, Transaction};
use crate::query::{EntityQuery, Filter};
use crate::types::{EntityRecord, StoredEntity};

/// Bookstore operations backed by a storage handle.
pub struct Catalog<S: ?Sized> {
    storage: Arc<S>,
    codes: CodeGenerator,
}

impl<S: ?Sized> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            codes: self.codes.clone(),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for Catalog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("codes", &self.codes)
            .finish_non_exhaustive()
    }
}

/// Payloads that belong to one user.
pub(crate) trait Owned {
    fn owner_id(&self) -> u64;
}

impl Owned for Purchase {
    fn owner_id(&self) -> u64 {
        self.user_id
    }
}

impl Owned for Transaction {
    fn owner_id(&self) -> u64 {
        self.user_id
    }
}

impl Owned for FavoriteBook {
    fn owner_id(&self) -> u64 {
        self.user_id
    }
}

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    /// Creates a catalog with the default code prefixes.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_codes(storage, CodeGenerator::default())
    }

    /// Creates a catalog with a custom code generator.
    pub fn with_codes(storage: Arc<S>, codes: CodeGenerator) -> Self {
        Self { storage, codes }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn codes(&self) -> &CodeGenerator {
        &self.codes
    }

    /// How the next row of `T` gets its code inside a batch.
    pub(crate) fn code_assignment<T: Entity>(&self) -> CodeAssignment {
        match self.codes.prefix_for(T::KIND) {
            Some(prefix) => CodeAssignment::Sequential {
                prefix: prefix.to_string(),
            },
            None => CodeAssignment::None,
        }
    }

    /// Validates and inserts `entity`, assigning a code if its kind has one.
    pub(crate) async fn insert<T: Entity>(&self, entity: &T) -> StorageResult<StoredEntity<T>> {
        entity.validate()?;
        let data = serde_json::to_value(entity)?;

        let record = match self.codes.prefix_for(T::KIND) {
            Some(prefix) => self.storage.create_coded(T::KIND, prefix, data).await?,
            None => self.storage.create(T::KIND, None, data).await?,
        };

        tracing::info!(kind = %T::KIND, id = record.id(), code = record.code(), "Created");
        record.into_typed()
    }

    /// Loads an active row of `T`.
    pub(crate) async fn load<T: Entity>(&self, id: u64) -> StorageResult<StoredEntity<T>> {
        self.storage
            .read(T::KIND, id)
            .await?
            .ok_or_else(|| StorageError::not_found(T::KIND, id))?
            .into_typed()
    }

    /// Loads an active row of `T` that belongs to `user_id`.
    pub(crate) async fn load_owned<T: Entity + Owned>(
        &self,
        user_id: u64,
        id: u64,
    ) -> StorageResult<StoredEntity<T>> {
        let entity = self.load::<T>(id).await?;
        if entity.data().owner_id() != user_id {
            return Err(StorageError::not_found(T::KIND, id));
        }
        Ok(entity)
    }

    /// Validates `entity` and writes it over `current`.
    pub(crate) async fn replace<T: Entity>(
        &self,
        current: &StoredEntity<T>,
        entity: &T,
    ) -> StorageResult<StoredEntity<T>> {
        entity.validate()?;
        let data = serde_json::to_value(entity)?;
        self.storage
            .update(T::KIND, current.id(), current.version(), data)
            .await?
            .into_typed()
    }

    /// Loads every active row of `T` whose id is in `ids`, keyed by id.
    pub(crate) async fn load_many<T: Entity>(
        &self,
        ids: impl IntoIterator<Item = u64>,
    ) -> StorageResult<HashMap<u64, StoredEntity<T>>> {
        let ids: BTreeSet<u64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = EntityQuery::new(T::KIND).filter(Filter::is_in("id", ids));
        self.storage
            .fetch_all(&query)
            .await?
            .into_iter()
            .map(|record| record.into_typed().map(|e: StoredEntity<T>| (e.id(), e)))
            .collect()
    }
}

/// The row written by the first op of an applied batch.
pub(crate) fn first_record(outcomes: Vec<WriteOutcome>) -> StorageResult<EntityRecord> {
    outcomes
        .into_iter()
        .next()
        .and_then(WriteOutcome::into_record)
        .ok_or_else(|| {
            BackendError::Internal {
                backend_name: "catalog".to_string(),
                message: "batch returned no record for its first op".to_string(),
                source: None,
            }
            .into()
        })
}

/// Applies an RFC 7396 merge patch to the payload of `current`.
///
/// Fails with `InvalidParameter` if the patched document no longer
/// deserializes as `T`. The result is not validated.
pub(crate) fn merge_patch<T: Entity>(
    current: &StoredEntity<T>,
    patch: &Value,
) -> StorageResult<T> {
    if !patch.is_object() {
        return Err(StorageError::invalid_parameter(
            "patch",
            patch.to_string(),
            "a merge patch must be a JSON object",
        ));
    }

    let mut document = serde_json::to_value(current.data())?;
    json_patch::merge(&mut document, patch);

    serde_json::from_value(document).map_err(|e| {
        StorageError::invalid_parameter("patch", patch.to_string(), e.to_string())
    })
}
