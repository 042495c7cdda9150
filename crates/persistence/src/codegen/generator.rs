use std::sync::Arc;

use crate::core::EntityStorage;
use crate::error::{BackendError, StorageResult};
use crate::query::EntityQuery;
use crate::types::EntityKind;

use super::{PrefixRegistry, format_code};

/// Produces the next code for an entity kind.
///
/// Stateless apart from the injected registry; safe to share and to call
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    registry: Arc<PrefixRegistry>,
}

impl CodeGenerator {
    pub fn new(registry: PrefixRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Shares an existing registry.
    pub fn from_shared(registry: Arc<PrefixRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PrefixRegistry {
        &self.registry
    }

    /// Returns the prefix for `kind`, if the kind carries codes.
    pub fn prefix_for(&self, kind: EntityKind) -> Option<&str> {
        self.registry.prefix(kind)
    }

    /// Returns the code the next `kind` row would receive.
    ///
    /// # Errors
    ///
    /// * `ValidationError::UnknownEntityType` if `kind` has no prefix
    /// * `BackendError::Unavailable` if the row count cannot be read
    pub async fn generate<S>(&self, storage: &S, kind: EntityKind) -> StorageResult<String>
    where
        S: EntityStorage + ?Sized,
    {
        let prefix = self.registry.require(kind)?;

        let query = EntityQuery::new(kind).include_deleted();
        let count = storage
            .count(&query)
            .await
            .map_err(|e| BackendError::Unavailable {
                backend_name: storage.backend_name().to_string(),
                message: format!("failed to count {} rows: {}", kind, e),
            })?;

        Ok(format_code(prefix, count))
    }

    /// Like [`generate`](Self::generate), for a kind named at runtime
    /// (`"Author"`, `"favorite_book"`, ...).
    pub async fn generate_for_name<S>(&self, storage: &S, entity_type: &str) -> StorageResult<String>
    where
        S: EntityStorage + ?Sized,
    {
        let kind: EntityKind = entity_type.parse()?;
        self.generate(storage, kind).await
    }
}
